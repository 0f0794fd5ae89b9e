use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("permission denied")]
    PermissionDenied,
    #[error("user not found")]
    UserNotFound,
    #[error("trip not found")]
    TripNotFound,
    #[error("join request not found")]
    RequestNotFound,
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("trip is already full")]
    TripFull,
    #[error("trip capacity must be at least 1")]
    InvalidCapacity,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::InvalidCapacity => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::TripNotFound | AppError::RequestNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::InvalidState(_) | AppError::TripFull => StatusCode::CONFLICT,
        };

        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}
