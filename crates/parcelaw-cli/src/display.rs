//! Human-readable rendering of resolutions: answer cards and zone reports.

use parcelaw_core::answer::AnswerStatus;
use parcelaw_core::citations::{citation_url, full_citation_text};
use parcelaw_core::{Answer, Resolution};

/// One answer as a terminal card.
pub fn answer_card(resolution: &Resolution) -> String {
    let answer = &resolution.answer;
    let mut out = String::new();
    out.push_str(&format!("{}\n", heading(answer)));

    match answer.status {
        AnswerStatus::Answered => {
            if let (Some(value), Some(unit)) = (answer.value, answer.unit.as_deref()) {
                out.push_str(&format!(
                    "  {value} {unit}  (source: {})\n",
                    answer.provenance.as_str()
                ));
            }
        }
        AnswerStatus::NeedsReview => {
            out.push_str("  needs review\n");
            if let Some(message) = &resolution.conflict_message {
                out.push_str(&format!("  {message}\n"));
            }
        }
        AnswerStatus::Missing => {
            out.push_str("  no answer available\n");
        }
    }

    if let Some(rationale) = &answer.rationale {
        out.push_str(&format!("  {rationale}\n"));
    }
    for citation in &answer.citations {
        out.push_str(&format!("  — {}\n", full_citation_text(citation)));
        if let Some(url) = citation_url(citation) {
            out.push_str(&format!("    {url}\n"));
        }
    }
    out
}

fn heading(answer: &Answer) -> String {
    match answer.answer_id.as_deref() {
        Some(id) => format!("## {id}"),
        None => format!("## {}", answer.intent),
    }
}

/// Markdown report covering all intents for one zone.
pub fn zone_report(zone: &str, jurisdiction: &str, resolutions: &[Resolution]) -> String {
    let mut out = format!("# Zoning report: {zone} ({jurisdiction})\n\n");
    for resolution in resolutions {
        out.push_str(&answer_card(resolution));
        out.push('\n');
    }
    let flagged = resolutions
        .iter()
        .filter(|r| r.answer.status == AnswerStatus::NeedsReview)
        .count();
    if flagged > 0 {
        out.push_str(&format!(
            "{flagged} answer(s) need human review before relying on this report.\n"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelaw_core::{Intent, Provenance};
    use parcelaw_core::answer::CodeCitation;

    fn resolution(answer: Answer) -> Resolution {
        Resolution {
            answer,
            trace: None,
            conflict_sources: None,
            conflict_message: None,
        }
    }

    #[test]
    fn card_shows_value_and_citation() {
        let answer = Answer::answered(
            Intent::FrontSetback,
            25.0,
            "ft",
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492").with_anchor("(B)(1)")],
            Provenance::Rule,
        )
        .with_answer_id("SF3");
        let card = answer_card(&resolution(answer));
        assert!(card.contains("## SF3:front_setback"));
        assert!(card.contains("25 ft  (source: rule)"));
        assert!(card.contains("Section 25-2-492 (B)(1)"));
        assert!(card.contains("municode.com"));
    }

    #[test]
    fn card_flags_needs_review() {
        let answer = Answer::needs_review(
            Intent::FrontSetback,
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492")],
            Provenance::Conflict,
        );
        let mut res = resolution(answer);
        res.conflict_message = Some("Conflicting values: overlay (HD): 30 ft".to_string());
        let card = answer_card(&res);
        assert!(card.contains("needs review"));
        assert!(card.contains("Conflicting values"));
    }

    #[test]
    fn report_counts_flagged_answers() {
        let answered = resolution(Answer::answered(
            Intent::FrontSetback,
            25.0,
            "ft",
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492")],
            Provenance::Rule,
        ));
        let review = resolution(Answer::needs_review(
            Intent::MaxHeight,
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492")],
            Provenance::Conflict,
        ));
        let report = zone_report("SF-3", "austin", &[answered, review]);
        assert!(report.starts_with("# Zoning report: SF-3 (austin)"));
        assert!(report.contains("1 answer(s) need human review"));
    }
}
