// Common test utilities and helpers

use crate::services::analysis::{AnalysisError, AnalysisServiceImpl, CompletionService};
use crate::{AppState, build_router};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{Method, header},
    response::Response,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

enum Reply {
    Text(String),
    Fail(fn() -> AnalysisError),
}

/// Completion double that always gives the same answer and counts calls
pub struct MockCompletion {
    reply: Reply,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn text(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Reply::Text(reply.to_string()), calls: AtomicUsize::new(0) })
    }

    pub fn failing(make_error: fn() -> AnalysisError) -> Arc<Self> {
        Arc::new(Self { reply: Reply::Fail(make_error), calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(make_error) => Err(make_error()),
        }
    }
}

/// Build the real router around a mock completion service
pub fn create_test_app(completion: Arc<MockCompletion>, strict_status_codes: bool) -> Router {
    let analysis_service = Arc::new(AnalysisServiceImpl::new(completion));
    build_router(Arc::new(AppState { analysis_service, strict_status_codes }))
}

/// POST a raw body to /api/analyze
pub fn analyze_request(body: impl Into<Body>) -> Request {
    Request::builder()
        .method(Method::POST)
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("Failed to create test request")
}

/// Read a response body as JSON
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
