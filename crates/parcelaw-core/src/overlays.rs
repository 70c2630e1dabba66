//! Overlay district adjustments.
//!
//! An overlay district adjusts (rather than replaces) the base district's
//! values. Adjustments apply in a fixed order: a single `replace` first,
//! then `min`/`max` constraints in list order, then `add` increments in
//! list order.

use serde::{Deserialize, Serialize};

use crate::answer::{Answer, AnswerStatus, CodeCitation, Intent, Provenance};
use crate::trace::TraceStep;

/// Adjustment operation.
///
/// `Min` and `Max` name the *constraint*, not the math function applied:
/// a "min constraint" is a floor (`result = max(current, x)`), a "max
/// constraint" is a ceiling (`result = min(current, x)`). This inversion is
/// intentional domain vocabulary ("the setback must be at least 30 ft").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentOp {
    Replace,
    Add,
    Min,
    Max,
}

impl AdjustmentOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Add => "add",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Apply this operation to a running value.
    pub fn apply(&self, current: f64, x: f64) -> f64 {
        match self {
            Self::Replace => x,
            Self::Add => current + x,
            Self::Min => current.max(x),
            Self::Max => current.min(x),
        }
    }
}

/// One overlay district's adjustment definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayAdjustment {
    /// Overlay district ID, e.g. "HD" or "NP".
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub applies_to: Vec<Intent>,
    pub op: AdjustmentOp,
    pub value: f64,
    pub unit: String,
    pub citations: Vec<CodeCitation>,
}

/// Result of applying overlay adjustments to an answer.
#[derive(Debug, Clone)]
pub struct OverlayOutcome {
    pub answer: Answer,
    /// IDs of overlays that actually changed or asserted the value.
    pub applied: Vec<String>,
    /// One trace step per applied overlay, in application order.
    pub steps: Vec<TraceStep>,
    /// Whether a `replace` overlay asserted the value independently.
    pub replaced: bool,
}

/// Apply the overlay adjustments active on a parcel to a base answer.
///
/// Overlays are filtered to those whose `applies_to` covers the answer's
/// intent and whose ID is in `active_ids`. Returns the input unchanged when
/// the answer has no value to adjust. A `min`/`max` constraint that leaves
/// the value unchanged is treated as not applied: no citation, no step.
///
/// Applied overlays' citations are prepended to the answer's citation list,
/// so the most recently applied overlay cites first. Inputs are not mutated.
pub fn apply_overlay_adjustments(
    answer: &Answer,
    overlays: &[OverlayAdjustment],
    active_ids: &[String],
) -> OverlayOutcome {
    let applicable: Vec<&OverlayAdjustment> = overlays
        .iter()
        .filter(|o| active_ids.contains(&o.id) && o.applies_to.contains(&answer.intent))
        .collect();

    let Some(base_value) = answer.value else {
        return OverlayOutcome {
            answer: answer.clone(),
            applied: Vec::new(),
            steps: Vec::new(),
            replaced: false,
        };
    };
    if applicable.is_empty() || answer.status != AnswerStatus::Answered {
        return OverlayOutcome {
            answer: answer.clone(),
            applied: Vec::new(),
            steps: Vec::new(),
            replaced: false,
        };
    }

    let mut value = base_value;
    let mut applied: Vec<String> = Vec::new();
    let mut steps: Vec<TraceStep> = Vec::new();
    let mut citations = answer.citations.clone();
    let mut replaced = false;

    let mut apply_one = |overlay: &OverlayAdjustment, value: &mut f64| {
        let result = overlay.op.apply(*value, overlay.value);
        steps.push(TraceStep::overlay(
            &overlay.id,
            overlay.op,
            overlay.value,
            result,
            overlay.citations.clone(),
        ));
        applied.push(overlay.id.clone());
        citations.splice(0..0, overlay.citations.iter().cloned());
        *value = result;
    };

    // A replace fully supersedes the base value; only the first one counts.
    if let Some(overlay) = applicable.iter().copied().find(|o| o.op == AdjustmentOp::Replace) {
        apply_one(overlay, &mut value);
        replaced = true;
    }

    // Constraints clamp the running value; skipped when they change nothing.
    for overlay in applicable
        .iter()
        .copied()
        .filter(|o| matches!(o.op, AdjustmentOp::Min | AdjustmentOp::Max))
    {
        let before = value;
        if overlay.op.apply(before, overlay.value) != before {
            apply_one(overlay, &mut value);
        }
    }

    // Additive adjustments always apply.
    for overlay in applicable.iter().copied().filter(|o| o.op == AdjustmentOp::Add) {
        apply_one(overlay, &mut value);
    }

    let provenance = if applied.is_empty() {
        answer.provenance
    } else {
        Provenance::Overlay
    };
    let unit = answer.unit.clone().unwrap_or_default();
    let mut adjusted = Answer::answered(answer.intent, value, &unit, citations, provenance);
    adjusted.rationale = answer.rationale.clone();
    adjusted.answer_id = answer.answer_id.clone();

    OverlayOutcome {
        answer: adjusted,
        applied,
        steps,
        replaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(value: f64) -> Answer {
        Answer::answered(
            Intent::FrontSetback,
            value,
            "ft",
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492")],
            Provenance::Rule,
        )
    }

    fn overlay(id: &str, op: AdjustmentOp, value: f64) -> OverlayAdjustment {
        OverlayAdjustment {
            id: id.to_string(),
            name: String::new(),
            applies_to: vec![Intent::FrontSetback],
            op,
            value,
            unit: "ft".to_string(),
            citations: vec![CodeCitation::new("austin_ldc_2024", "25-2-900")],
        }
    }

    fn active(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn min_constraint_raises_value() {
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[overlay("HD", AdjustmentOp::Min, 30.0)],
            &active(&["HD"]),
        );
        assert_eq!(out.answer.value, Some(30.0));
        assert_eq!(out.answer.provenance, Provenance::Overlay);
        assert_eq!(out.applied, vec!["HD"]);
    }

    #[test]
    fn max_constraint_lowers_value() {
        let out = apply_overlay_adjustments(
            &base(40.0),
            &[overlay("HD", AdjustmentOp::Max, 35.0)],
            &active(&["HD"]),
        );
        assert_eq!(out.answer.value, Some(35.0));
    }

    #[test]
    fn add_increments_value() {
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[overlay("NP", AdjustmentOp::Add, 5.0)],
            &active(&["NP"]),
        );
        assert_eq!(out.answer.value, Some(30.0));
    }

    #[test]
    fn replace_supersedes_base() {
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[overlay("WO", AdjustmentOp::Replace, 30.0)],
            &active(&["WO"]),
        );
        assert_eq!(out.answer.value, Some(30.0));
        assert!(out.replaced);
    }

    #[test]
    fn only_first_replace_used() {
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[
                overlay("A", AdjustmentOp::Replace, 30.0),
                overlay("B", AdjustmentOp::Replace, 99.0),
            ],
            &active(&["A", "B"]),
        );
        assert_eq!(out.answer.value, Some(30.0));
        assert_eq!(out.applied, vec!["A"]);
    }

    #[test]
    fn replace_then_constraint_then_add_order() {
        // replace 30, floor 32, add 5 → 37; definitions listed out of order.
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[
                overlay("ADD", AdjustmentOp::Add, 5.0),
                overlay("FLOOR", AdjustmentOp::Min, 32.0),
                overlay("REP", AdjustmentOp::Replace, 30.0),
            ],
            &active(&["ADD", "FLOOR", "REP"]),
        );
        assert_eq!(out.answer.value, Some(37.0));
        assert_eq!(out.applied, vec!["REP", "FLOOR", "ADD"]);
        assert_eq!(out.steps.len(), 3);
    }

    #[test]
    fn noop_constraint_not_recorded() {
        // Floor of 20 on a value of 25 changes nothing.
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[overlay("HD", AdjustmentOp::Min, 20.0)],
            &active(&["HD"]),
        );
        assert_eq!(out.answer.value, Some(25.0));
        assert!(out.applied.is_empty());
        assert!(out.steps.is_empty());
        assert_eq!(out.answer.provenance, Provenance::Rule);
        assert_eq!(out.answer.citations.len(), 1);
    }

    #[test]
    fn inactive_overlay_ignored() {
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[overlay("HD", AdjustmentOp::Min, 30.0)],
            &active(&["NP"]),
        );
        assert_eq!(out.answer.value, Some(25.0));
        assert!(out.applied.is_empty());
    }

    #[test]
    fn wrong_intent_ignored() {
        let mut o = overlay("HD", AdjustmentOp::Min, 30.0);
        o.applies_to = vec![Intent::MaxHeight];
        let out = apply_overlay_adjustments(&base(25.0), &[o], &active(&["HD"]));
        assert!(out.applied.is_empty());
    }

    #[test]
    fn needs_review_answer_untouched() {
        let a = Answer::needs_review(
            Intent::FrontSetback,
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492")],
            Provenance::Rule,
        );
        let out = apply_overlay_adjustments(
            &a,
            &[overlay("HD", AdjustmentOp::Min, 30.0)],
            &active(&["HD"]),
        );
        assert_eq!(out.answer, a);
        assert!(out.applied.is_empty());
    }

    #[test]
    fn applied_overlay_citations_prepended() {
        let out = apply_overlay_adjustments(
            &base(25.0),
            &[overlay("HD", AdjustmentOp::Min, 30.0)],
            &active(&["HD"]),
        );
        assert_eq!(out.answer.citations.len(), 2);
        assert_eq!(out.answer.citations[0].section, "25-2-900");
        assert_eq!(out.answer.citations[1].section, "25-2-492");
    }

    #[test]
    fn inputs_not_mutated() {
        let a = base(25.0);
        let defs = [overlay("HD", AdjustmentOp::Min, 30.0)];
        let _ = apply_overlay_adjustments(&a, &defs, &active(&["HD"]));
        assert_eq!(a.value, Some(25.0));
        assert_eq!(a.citations.len(), 1);
    }
}
