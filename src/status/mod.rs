pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

/// `/health` and `/metrics`; both are answered locally.
pub fn setup_status_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
}
