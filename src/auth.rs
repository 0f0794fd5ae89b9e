use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{session::Session, user::User},
    state::AppState,
    store,
};

pub const SESSION_COOKIE: &str = "sharexe_session";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub uuid: String,
    pub username: String,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            uuid: user.uuid,
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let jar = PrivateCookieJar::from_headers(&parts.headers, Key::from_ref(&state));

        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        Ok(Self(session_user(&state, cookie.value()).await?))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

pub async fn register_user(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "username, email and password are required".into(),
        ));
    }

    let mut conn = state.db.acquire().await?;
    if store::users::username_taken(&mut *conn, username).await? {
        return Err(AppError::BadRequest("username is already taken".into()));
    }
    if store::users::email_taken(&mut *conn, email).await? {
        return Err(AppError::BadRequest("email address is already in use".into()));
    }

    let password_hash = hash_password(password)?;
    let user = store::users::insert(
        &mut *conn,
        &Uuid::new_v4().to_string(),
        username,
        email,
        &password_hash,
        Utc::now(),
    )
    .await?;

    Ok(user.into())
}

pub async fn authenticate_user(
    state: &AppState,
    identifier: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let mut conn = state.db.acquire().await?;
    let user = store::users::find_by_username_or_email(&mut *conn, identifier.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|err| AppError::Other(anyhow::anyhow!("corrupt password hash: {err}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)?;

    store::users::touch_last_login(&mut *conn, user.id, Utc::now()).await?;

    Ok(user.into())
}

pub async fn create_session(state: &AppState, user_id: i64) -> Result<String, AppError> {
    let session_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let expires_at = now + Duration::hours(state.config.session_ttl_hours);

    sqlx::query(
        "INSERT INTO sessions (id, user_id, created_at, last_seen_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .bind(expires_at)
    .execute(&state.db)
    .await?;

    Ok(session_id)
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, String::new()))
        .path("/")
        .build();
    jar.remove(cookie)
}

async fn session_user(
    state: &AppState,
    session_id: &str,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let now = Utc::now();
    let session: Option<Session> = sqlx::query_as(
        "SELECT id, user_id, created_at, last_seen_at, expires_at FROM sessions WHERE id = ?1",
    )
    .bind(session_id)
    .fetch_optional(&state.db)
    .await?;

    let Some(session) = session else {
        return Ok(None);
    };
    if session.expires_at <= now {
        destroy_session(state, &session.id).await?;
        return Ok(None);
    }

    sqlx::query("UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(&session.id)
        .execute(&state.db)
        .await?;

    let mut conn = state.db.acquire().await?;
    let user = store::users::find_by_id(&mut *conn, session.user_id).await?;
    Ok(user.map(Into::into))
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}
