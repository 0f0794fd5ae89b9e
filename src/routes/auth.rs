use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    services,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Deserialize)]
struct SignupPayload {
    username: String,
    email: String,
    password: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<Response, AppError> {
    auth::register_user(&state, &payload.username, &payload.email, &payload.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "user registered successfully" })),
    )
        .into_response())
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(rename = "usernameOrEmail")]
    username_or_email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, AppError> {
    let user =
        auth::authenticate_user(&state, &payload.username_or_email, &payload.password).await?;
    let session_id = auth::create_session(&state, user.id).await?;
    let body = services::users::get_user(&state.db, user.id).await?;
    Ok((auth::apply_session_cookie(jar, &session_id), Json(body)).into_response())
}

async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(auth::SESSION_COOKIE) {
        auth::destroy_session(&state, cookie.value()).await?;
    }
    Ok((
        auth::clear_session_cookie(jar),
        Json(json!({ "success": true, "message": "logged out" })),
    )
        .into_response())
}

async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let body = services::users::get_user(&state.db, user.id).await?;
    Ok(Json(body).into_response())
}
