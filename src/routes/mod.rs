pub mod auth;
pub mod trip;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/trips", trip::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
