pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;
use crate::timeline::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/timeline", get(handlers::handle_get_timeline))
        .with_state(state)
}
