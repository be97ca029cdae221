//! Requirements Analysis Pipeline
//!
//! Turns a free-text requirements document into a gap analysis and a design
//! checklist by delegating the reasoning to an external completion service.
//!
//! # Flow
//! ```text
//! validator ──▶ prompt ──▶ client ──▶ splitter ──▶ shaper ──▶ AnalysisResult
//!     │            │          │           │
//!     └────────────┴──────────┴───────────┴──▶ AnalysisError (error.rs)
//! ```
//!
//! The client sits behind the `CompletionService` trait so tests and other
//! providers can be substituted; `retry` wraps it with an optional backoff policy.

mod client;
mod error;
mod prompt;
mod retry;
mod service;
mod shaper;
mod splitter;
mod validator;

pub use client::{AnthropicClient, CompletionService};
pub use error::{AnalysisError, ErrorKind};
pub use prompt::PromptBuilder;
pub use retry::RetryPolicy;
pub use service::{AnalysisService, AnalysisServiceImpl};
pub use shaper::{shape, strip_gap_label};
pub use splitter::{
    CHECKLIST_MARKER, FALLBACK_CHECKLIST, GAP_ANALYSIS_LABEL, Sections, split_response,
};
pub use validator::{validate_body, validate_content};
