pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::extract::MAX_UPLOAD_BYTES;
use crate::analysis::handlers;
use crate::state::AppState;

/// Room for the multipart envelope and text fields around the file itself.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/v1/analyses",
            get(handlers::handle_list_analyses).post(handlers::handle_analyze),
        )
        .route(
            "/api/v1/analyses/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/analyses/:id", get(handlers::handle_get_analysis))
        // Analytics API
        .route("/api/v1/analytics", get(handlers::handle_get_analytics))
        .with_state(state)
}
