//! Citation display helpers: section formatting and public code URLs.

use crate::answer::CodeCitation;

/// Public URL for a citation, when the code has an online source.
pub fn citation_url(citation: &CodeCitation) -> Option<String> {
    match citation.code_id.as_str() {
        "austin_ldc_2024" => Some(format!(
            "https://library.municode.com/tx/austin/codes/land_development_code?nodeId={}",
            citation.section
        )),
        _ => None,
    }
}

/// Section with anchor, e.g. "25-2-492 (B)(1)".
pub fn format_citation(citation: &CodeCitation) -> String {
    match &citation.anchor {
        Some(anchor) => format!("{} {anchor}", citation.section),
        None => citation.section.clone(),
    }
}

/// Full human-readable citation, e.g.
/// "Austin Land Development Code (2024), Section 25-2-492 (B)(1)".
pub fn full_citation_text(citation: &CodeCitation) -> String {
    format!(
        "{}, Section {}",
        code_name(&citation.code_id),
        format_citation(citation)
    )
}

fn code_name(code_id: &str) -> &str {
    match code_id {
        "austin_ldc_2024" => "Austin Land Development Code (2024)",
        other => other,
    }
}
