//! Normalizes split sections into the public result

use crate::models::AnalysisResult;

use super::splitter::{FALLBACK_CHECKLIST, GAP_ANALYSIS_LABEL, Sections};

/// Build the result; a missing or blank checklist becomes `FALLBACK_CHECKLIST`.
pub fn shape(sections: Sections<'_>) -> AnalysisResult {
    let gap_analysis = strip_gap_label(sections.gap_analysis);
    let checklist = sections
        .checklist
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(FALLBACK_CHECKLIST)
        .to_string();

    AnalysisResult { gap_analysis, checklist }
}

/// Trim and drop any leading `GAP ANALYSIS:` labels.
///
/// Repeated labels are all removed so that stripping twice equals stripping once.
pub fn strip_gap_label(section: &str) -> String {
    let mut text = section.trim();
    while let Some(rest) = text.strip_prefix(GAP_ANALYSIS_LABEL) {
        text = rest.trim_start();
    }
    text.trim_end().to_string()
}
