use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body accepted by `POST /api/analyze`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    /// Requirements document: PRD, user story, or epic
    #[schema(example = "As a user I want to log in")]
    pub content: String,
}

/// Successful analysis payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub gap_analysis: String,
    pub checklist: String,
}

/// Error payload returned for every failed analysis
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable error kind, e.g. `invalid_input` or `upstream_error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
