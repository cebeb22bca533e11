pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

/// Upper bound for CV uploads.
const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/extract-requirements",
            post(handlers::handle_extract_requirements),
        )
        .route(
            "/api/v1/analyze-document",
            post(handlers::handle_analyze_document)
                .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES)),
        )
        .route(
            "/api/v1/analysis-summary",
            get(handlers::handle_analysis_summary),
        )
        .route("/api/v1/score-match", post(handlers::handle_score_match))
        .with_state(state)
}
