//! Analysis Service Trait and Implementation
//!
//! validate -> build prompt -> complete -> split -> shape. Each call is
//! independent; the only shared state is read-only configuration.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::client::CompletionService;
use super::error::AnalysisError;
use super::prompt::PromptBuilder;
use super::retry::RetryPolicy;
use super::{shaper, splitter, validator};
use crate::models::AnalysisResult;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyze a decoded document.
    async fn analyze(&self, content: &str) -> Result<AnalysisResult, AnalysisError>;

    /// Analyze a raw JSON request body of the form `{ "content": string }`.
    async fn analyze_body(&self, body: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let content = validator::validate_body(body)?;
        self.analyze(&content).await
    }
}

pub struct AnalysisServiceImpl {
    client: Arc<dyn CompletionService>,
    prompt_builder: PromptBuilder,
    retry_policy: RetryPolicy,
}

impl AnalysisServiceImpl {
    pub fn new(client: Arc<dyn CompletionService>) -> Self {
        Self { client, prompt_builder: PromptBuilder::new(), retry_policy: RetryPolicy::none() }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    async fn run(&self, content: &str) -> Result<AnalysisResult, AnalysisError> {
        let content = validator::validate_content(content)?;
        let prompt = self.prompt_builder.build(&content);

        let client = &self.client;
        let prompt = prompt.as_str();
        let start = std::time::Instant::now();
        let raw = self
            .retry_policy
            .run(move |attempt| {
                if attempt > 0 {
                    tracing::info!("Completion retry attempt {}", attempt + 1);
                }
                client.complete(prompt)
            })
            .await?;
        tracing::info!(
            "Completion received: {} chars in {}ms",
            raw.len(),
            start.elapsed().as_millis()
        );
        tracing::debug!("Raw completion text: {}", raw);

        let sections = splitter::split_response(&raw);
        if sections.checklist.is_none() {
            tracing::warn!(
                "Completion had no '{}' section, using fallback checklist",
                splitter::CHECKLIST_MARKER
            );
        }

        Ok(shaper::shape(sections))
    }
}

#[async_trait]
impl AnalysisService for AnalysisServiceImpl {
    async fn analyze(&self, content: &str) -> Result<AnalysisResult, AnalysisError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("analyze", %request_id, content_len = content.len());

        async {
            tracing::info!("Analysis request received");
            let result = self.run(content).await;
            match &result {
                Ok(_) => tracing::info!("Analysis completed"),
                Err(AnalysisError::Internal(cause)) => {
                    tracing::error!("Analysis failed with internal error: {}", cause)
                },
                Err(e) => tracing::warn!("Analysis failed ({}): {}", e.kind(), e),
            }
            result
        }
        .instrument(span)
        .await
    }
}
