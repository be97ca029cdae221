//! Analysis prompt template

const TEMPLATE: &str = include_str!("analysis_prompt.md");
const PLACEHOLDER: &str = "{content}";

/// Renders the fixed instruction template around a document.
///
/// The template is split once at its placeholder, so document text that
/// happens to contain `{content}` is inserted verbatim and never re-expanded.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    head: &'static str,
    tail: &'static str,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        let (head, tail) = TEMPLATE.split_once(PLACEHOLDER).unwrap_or((TEMPLATE, ""));
        Self { head, tail }
    }

    pub fn build(&self, content: &str) -> String {
        let mut prompt = String::with_capacity(self.head.len() + content.len() + self.tail.len());
        prompt.push_str(self.head);
        prompt.push_str(content);
        prompt.push_str(self.tail);
        prompt
    }
}
