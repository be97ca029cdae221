//! Analysis API Handler
//!
//! POST /api/analyze - the single public entry point of the pipeline.

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::AppState;
use crate::models::{AnalysisResult, ErrorResponse};
use crate::services::analysis::{AnalysisError, AnalysisService, ErrorKind};

/// Analyze a requirements document
///
/// The body is read as raw bytes so malformed JSON is reported in the same
/// error shape as every other failure. A body the framework refuses to
/// buffer (e.g. over the size limit) is reported as invalid input.
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = crate::models::AnalysisRequest,
    responses(
        (status = 200, description = "Gap analysis and design checklist", body = AnalysisResult),
        (status = 400, description = "Invalid input (only with strict status codes)", body = ErrorResponse),
        (status = 500, description = "Analysis failed", body = ErrorResponse)
    ),
    tag = "Analysis"
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnalysisResult>, AnalyzeApiError> {
    let strict_status_codes = state.strict_status_codes;
    let body = body.map_err(|rejection| {
        tracing::warn!("Request body rejected ({}): {}", rejection.status(), rejection.body_text());
        AnalyzeApiError {
            error: AnalysisError::InvalidInput(format!(
                "request body could not be read: {}",
                rejection.body_text()
            )),
            strict_status_codes,
        }
    })?;

    let result = state
        .analysis_service
        .analyze_body(&body)
        .await
        .map_err(|error| AnalyzeApiError { error, strict_status_codes })?;

    Ok(Json(result))
}

// ============================================================================
// Error Handling
// ============================================================================

pub struct AnalyzeApiError {
    error: AnalysisError,
    strict_status_codes: bool,
}

impl AnalyzeApiError {
    fn status(&self) -> StatusCode {
        match self.error.kind() {
            ErrorKind::InvalidInput if self.strict_status_codes => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalyzeApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.error.public_message(),
            details: Some(self.error.kind().as_str().to_string()),
        };

        (status, Json(body)).into_response()
    }
}
