//! Request validation, run before anything touches the completion service

use serde_json::Value;

use super::error::AnalysisError;

/// Decode a raw request body and return the trimmed `content` field.
pub fn validate_body(body: &[u8]) -> Result<String, AnalysisError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AnalysisError::InvalidInput(format!("request body is not valid JSON: {}", e)))?;

    let Value::Object(fields) = value else {
        return Err(AnalysisError::InvalidInput("request body must be a JSON object".to_string()));
    };

    match fields.get("content") {
        None | Some(Value::Null) => {
            Err(AnalysisError::InvalidInput("content is required".to_string()))
        },
        Some(Value::String(content)) => validate_content(content),
        Some(_) => Err(AnalysisError::InvalidInput("content must be a string".to_string())),
    }
}

/// Reject empty and whitespace-only documents.
pub fn validate_content(content: &str) -> Result<String, AnalysisError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidInput("content must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
