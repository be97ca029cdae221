//! Readiness Library
//!
//! Requirements gap analysis and design checklist service.

use axum::{Router, routing::{get, post}};
use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{CompletionConfig, Config};
pub use models::{AnalysisRequest, AnalysisResult, ErrorResponse};
pub use services::analysis::{
    AnalysisError, AnalysisService, AnalysisServiceImpl, AnthropicClient, CompletionService,
    ErrorKind,
};

/// Application shared state
///
/// Read-only after startup; every request gets an `Arc` clone.
#[derive(Clone)]
pub struct AppState {
    pub analysis_service: Arc<AnalysisServiceImpl>,
    pub strict_status_codes: bool,
}

/// Build the HTTP router (API routes, health probes, tracing and CORS layers).
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/analyze", post(handlers::analyze::analyze))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .merge(api_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ready_check() -> &'static str {
    "READY"
}

#[cfg(test)]
mod tests;
