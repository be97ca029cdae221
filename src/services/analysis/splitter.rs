//! Section splitting for model output
//!
//! The model is asked for two labeled sections. This is a lenient textual
//! protocol, not a parser: the first checklist marker is the boundary and
//! nothing is escaped.

/// Label the model is asked to open the gap analysis with
pub const GAP_ANALYSIS_LABEL: &str = "GAP ANALYSIS:";

/// Boundary between the two sections (case-sensitive, first occurrence wins)
pub const CHECKLIST_MARKER: &str = "DESIGN CHECKLIST:";

/// Used when the model output has no checklist section
pub const FALLBACK_CHECKLIST: &str = "No checklist generated";

/// Raw, untrimmed slices of the completion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections<'a> {
    /// Everything before the marker, or the whole text when there is no marker
    pub gap_analysis: &'a str,
    /// Everything after the first marker; `None` when the marker is absent
    pub checklist: Option<&'a str>,
}

pub fn split_response(raw: &str) -> Sections<'_> {
    match raw.split_once(CHECKLIST_MARKER) {
        Some((gap_analysis, checklist)) => Sections { gap_analysis, checklist: Some(checklist) },
        None => Sections { gap_analysis: raw, checklist: None },
    }
}
