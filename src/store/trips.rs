use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    error::AppError,
    models::{
        page::PageParams,
        trip::{Trip, TripStatus},
    },
};

const TRIP_COLUMNS: &str = "id, created_by, starting_point, destination, max_capacity, \
     price_per_person, begin_at, end_at, description, status, created_at";

pub async fn insert(
    conn: &mut SqliteConnection,
    created_by: i64,
    starting_point: &str,
    destination: &str,
    max_capacity: i64,
    price_per_person: f64,
    begin_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    description: &str,
    created_at: DateTime<Utc>,
) -> Result<Trip, AppError> {
    let sql = format!(
        "INSERT INTO trips (created_by, starting_point, destination, max_capacity, \
         price_per_person, begin_at, end_at, description, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING {TRIP_COLUMNS}"
    );
    let trip = sqlx::query_as::<_, Trip>(&sql)
        .bind(created_by)
        .bind(starting_point)
        .bind(destination)
        .bind(max_capacity)
        .bind(price_per_person)
        .bind(begin_at)
        .bind(end_at)
        .bind(description)
        .bind(TripStatus::Waiting.as_str())
        .bind(created_at)
        .fetch_one(conn)
        .await?;
    Ok(trip)
}

pub async fn find(conn: &mut SqliteConnection, trip_id: i64) -> Result<Option<Trip>, AppError> {
    let sql = format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1");
    let trip = sqlx::query_as::<_, Trip>(&sql)
        .bind(trip_id)
        .fetch_optional(conn)
        .await?;
    Ok(trip)
}

pub async fn update_editable_fields(
    conn: &mut SqliteConnection,
    trip_id: i64,
    description: &str,
    begin_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    price_per_person: f64,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE trips SET description = ?1, begin_at = ?2, end_at = ?3, price_per_person = ?4
         WHERE id = ?5",
    )
    .bind(description)
    .bind(begin_at)
    .bind(end_at)
    .bind(price_per_person)
    .bind(trip_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Drops the trip's whole restriction list and writes the new one in order.
pub async fn replace_restrictions(
    conn: &mut SqliteConnection,
    trip_id: i64,
    restrictions: &[String],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM trip_restrictions WHERE trip_id = ?1")
        .bind(trip_id)
        .execute(&mut *conn)
        .await?;
    for (position, text) in restrictions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO trip_restrictions (trip_id, position, text) VALUES (?1, ?2, ?3)",
        )
        .bind(trip_id)
        .bind(position as i64)
        .bind(text)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn list_restrictions(
    conn: &mut SqliteConnection,
    trip_id: i64,
) -> Result<Vec<String>, AppError> {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT text FROM trip_restrictions WHERE trip_id = ?1 ORDER BY position",
    )
    .bind(trip_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn add_participant(
    conn: &mut SqliteConnection,
    trip_id: i64,
    user_id: i64,
    joined_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT OR IGNORE INTO trip_participants (trip_id, user_id, joined_at)
         VALUES (?1, ?2, ?3)",
    )
    .bind(trip_id)
    .bind(user_id)
    .bind(joined_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn count_participants(
    conn: &mut SqliteConnection,
    trip_id: i64,
) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trip_participants WHERE trip_id = ?1")
            .bind(trip_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}

pub async fn list_participants(
    conn: &mut SqliteConnection,
    trip_id: i64,
) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT user_id FROM trip_participants WHERE trip_id = ?1 ORDER BY joined_at, user_id",
    )
    .bind(trip_id)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

pub async fn list_by_status(
    conn: &mut SqliteConnection,
    status: TripStatus,
    params: PageParams,
) -> Result<Vec<Trip>, AppError> {
    let sql = format!(
        "SELECT {TRIP_COLUMNS} FROM trips WHERE status = ?1
         ORDER BY begin_at DESC LIMIT ?2 OFFSET ?3"
    );
    let trips = sqlx::query_as::<_, Trip>(&sql)
        .bind(status.as_str())
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(conn)
        .await?;
    Ok(trips)
}

pub async fn count_by_status(
    conn: &mut SqliteConnection,
    status: TripStatus,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE status = ?1")
        .bind(status.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn list_by_participant_and_status(
    conn: &mut SqliteConnection,
    user_id: i64,
    status: TripStatus,
    params: PageParams,
) -> Result<Vec<Trip>, AppError> {
    let sql = format!(
        "SELECT {TRIP_COLUMNS} FROM trips
         WHERE status = ?1
           AND id IN (SELECT trip_id FROM trip_participants WHERE user_id = ?2)
         ORDER BY begin_at DESC LIMIT ?3 OFFSET ?4"
    );
    let trips = sqlx::query_as::<_, Trip>(&sql)
        .bind(status.as_str())
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(conn)
        .await?;
    Ok(trips)
}

pub async fn count_by_participant_and_status(
    conn: &mut SqliteConnection,
    user_id: i64,
    status: TripStatus,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trips
         WHERE status = ?1
           AND id IN (SELECT trip_id FROM trip_participants WHERE user_id = ?2)",
    )
    .bind(status.as_str())
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

pub async fn list_by_creator_and_status(
    conn: &mut SqliteConnection,
    user_id: i64,
    status: TripStatus,
    params: PageParams,
) -> Result<Vec<Trip>, AppError> {
    let sql = format!(
        "SELECT {TRIP_COLUMNS} FROM trips WHERE status = ?1 AND created_by = ?2
         ORDER BY begin_at DESC LIMIT ?3 OFFSET ?4"
    );
    let trips = sqlx::query_as::<_, Trip>(&sql)
        .bind(status.as_str())
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(conn)
        .await?;
    Ok(trips)
}

pub async fn count_by_creator_and_status(
    conn: &mut SqliteConnection,
    user_id: i64,
    status: TripStatus,
) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE status = ?1 AND created_by = ?2")
            .bind(status.as_str())
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}
