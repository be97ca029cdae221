pub mod analysis;

pub use analysis::{AnalysisService, AnalysisServiceImpl, AnthropicClient, CompletionService};
