//! Error taxonomy for the analysis pipeline
//!
//! Every stage returns one of these variants; the HTTP layer only ever sees
//! `kind()` and `public_message()`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stable, client-visible failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    MissingCredential,
    UpstreamError,
    UnexpectedResponseShape,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::MissingCredential => "missing_credential",
            Self::UpstreamError => "upstream_error",
            Self::UnexpectedResponseShape => "unexpected_response_shape",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Completion service credential not configured")]
    MissingCredential,

    #[error("Completion service error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        retryable: bool,
    },

    #[error("Completion service timed out after {0}s")]
    Timeout(u64),

    #[error("Unexpected response from completion service: {0}")]
    UnexpectedResponseShape(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn upstream(message: impl Into<String>, status: Option<u16>) -> Self {
        let retryable = match status {
            Some(code) => code == 429 || code >= 500,
            None => true,
        };
        Self::Upstream { message: message.into(), status, retryable }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::MissingCredential => ErrorKind::MissingCredential,
            Self::Upstream { .. } | Self::Timeout(_) => ErrorKind::UpstreamError,
            Self::UnexpectedResponseShape(_) => ErrorKind::UnexpectedResponseShape,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Transient upstream failures only; everything else is a contract or
    /// configuration problem that another attempt will not fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream { retryable, .. } => *retryable,
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Message safe to return to callers. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Failed to analyze document".to_string(),
            other => other.to_string(),
        }
    }
}

/// Convert a reqwest transport failure, keeping the configured deadline for timeouts.
pub(crate) fn classify_transport(err: reqwest::Error, timeout_secs: u64) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::Timeout(timeout_secs)
    } else if err.is_connect() {
        AnalysisError::upstream(format!("Connection failed: {}", err.without_url()), None)
    } else {
        let status = err.status().map(|s| s.as_u16());
        AnalysisError::upstream(err.without_url().to_string(), status)
    }
}
