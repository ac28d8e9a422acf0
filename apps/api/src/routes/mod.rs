pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Résumé PDFs larger than this are rejected before extraction.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes/upload",
            post(handlers::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/analyses", post(handlers::handle_analyze))
        .route(
            "/api/v1/analyses/:id",
            get(handlers::handle_analysis_status),
        )
        .route(
            "/api/v1/analyses/:id/resume",
            post(handlers::handle_generate_resume),
        )
        .route(
            "/api/v1/analyses/:id/download",
            get(handlers::handle_download_resume),
        )
        .route("/api/v1/optimize", post(handlers::handle_optimize))
        .with_state(state)
}
