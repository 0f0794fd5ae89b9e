use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        page::PageParams,
        trip::{NewTrip, TripEdits},
        trip_request::ReplyDecision,
    },
    services,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_trip))
        .route("/waiting", get(waiting_trips))
        .route("/joined", get(joined_trips))
        .route("/created", get(created_trips))
        .route("/:id", get(get_trip).put(edit_trip))
        .route("/:id/join", post(request_to_join))
        .route("/requests/:id/reply", post(reply_to_request))
}

async fn create_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<NewTrip>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = services::trips::create_trip(&state.db, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(trip)).into_response())
}

async fn edit_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Json(payload): Json<TripEdits>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = services::trips::edit_trip(&state.db, user.id, trip_id, payload).await?;
    Ok(Json(trip).into_response())
}

async fn get_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = services::trips::get_trip(&state.db, user.id, trip_id).await?;
    Ok(Json(trip).into_response())
}

async fn waiting_trips(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let page = services::trips::waiting_trips(&state.db, params).await?;
    Ok(Json(page).into_response())
}

async fn joined_trips(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let page = services::trips::joined_trips(&state.db, user.id, params).await?;
    Ok(Json(page).into_response())
}

async fn created_trips(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let page = services::trips::created_trips(&state.db, user.id, params).await?;
    Ok(Json(page).into_response())
}

async fn request_to_join(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let request = services::requests::request_to_join(&state.db, trip_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(request)).into_response())
}

#[derive(Deserialize)]
struct ReplyPayload {
    accept: bool,
}

async fn reply_to_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(request_id): Path<i64>,
    Json(payload): Json<ReplyPayload>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let decision = if payload.accept {
        ReplyDecision::Accept
    } else {
        ReplyDecision::Decline
    };
    services::requests::reply_to_join_request(&state.db, request_id, user.id, decision).await?;
    Ok(Json(json!({ "success": true, "message": "reply recorded" })).into_response())
}
