use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{error::AppError, models::user::User};

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, uuid, username, email, password_hash, created_at, last_login_at
         FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn find_by_username_or_email(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, uuid, username, email, password_hash, created_at, last_login_at
         FROM users WHERE username = ?1 OR email = ?1",
    )
    .bind(identifier)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn username_taken(conn: &mut SqliteConnection, username: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
        .bind(username)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn email_taken(conn: &mut SqliteConnection, email: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
        .bind(email)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    uuid: &str,
    username: &str,
    email: &str,
    password_hash: &str,
    created_at: DateTime<Utc>,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (uuid, username, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, uuid, username, email, password_hash, created_at, last_login_at",
    )
    .bind(uuid)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn touch_last_login(
    conn: &mut SqliteConnection,
    user_id: i64,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_login_at = ?1 WHERE id = ?2")
        .bind(at)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
