//! Completion client - HTTP client for the Anthropic Messages API
//!
//! One request per call, no streaming. The first content block of the
//! response must be text; anything else is a contract violation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{AnalysisError, classify_transport};
use crate::config::CompletionConfig;

/// Boundary to the external text-completion service
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send a single user prompt and return the first text block of the reply.
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    http_client: Client,
    config: Arc<CompletionConfig>,
}

impl AnthropicClient {
    pub fn new(config: Arc<CompletionConfig>) -> Result<Self, AnalysisError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionService for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        let api_key = self.config.api_key().ok_or(AnalysisError::MissingCredential)?;
        let timeout_secs = self.config.timeout.as_secs();

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![RequestMessage { role: "user", content: prompt }],
        };

        let url = self.messages_url();
        tracing::debug!("Calling completion API: {} with model {}", url, self.config.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport(e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| format!("{}: {}", e.error.r#type, e.error.message))
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() { "Unknown error".to_string() } else { body }
                });
            return Err(AnalysisError::upstream(
                format!("API error {}: {}", status, detail),
                Some(status.as_u16()),
            ));
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                AnalysisError::UnexpectedResponseShape(format!(
                    "response body could not be decoded: {}",
                    e.without_url()
                ))
            } else {
                classify_transport(e, timeout_secs)
            }
        })?;

        if let Some(usage) = &body.usage {
            tracing::debug!(
                "Completion usage: input_tokens={}, output_tokens={}",
                usage.input_tokens,
                usage.output_tokens
            );
        }

        first_text_block(body.content)
    }
}

fn first_text_block(content: Vec<ContentBlock>) -> Result<String, AnalysisError> {
    let block = content.into_iter().next().ok_or_else(|| {
        AnalysisError::UnexpectedResponseShape("response contained no content blocks".to_string())
    })?;

    match (block.r#type.as_str(), block.text) {
        ("text", Some(text)) => Ok(text),
        ("text", None) => Err(AnalysisError::UnexpectedResponseShape(
            "text block without text".to_string(),
        )),
        (other, _) => Err(AnalysisError::UnexpectedResponseShape(format!(
            "first content block is '{}', expected 'text'",
            other
        ))),
    }
}

// ============================================================================
// Anthropic Messages API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    r#type: String,
    message: String,
}
