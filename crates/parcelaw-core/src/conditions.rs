//! Lot-condition exceptions.
//!
//! An exception is a lot-condition-triggered adjustment: a corner lot may
//! get a reduced side setback, a steep slope a larger one, and so on.
//! Predicates evaluate against the parcel's `LotContext` and fail closed —
//! a missing context field never grants an exception.

use serde::{Deserialize, Serialize};

use crate::answer::{Answer, AnswerStatus, CodeCitation, Intent, Provenance};
use crate::overlays::AdjustmentOp;
use crate::trace::TraceStep;

/// Frontage below this many feet triggers `min_frontage`.
pub const DEFAULT_FRONTAGE_THRESHOLD: f64 = 50.0;
/// Grade above this percentage triggers `steep_slope`.
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 15.0;

/// Physical conditions of the parcel being resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<bool>,
    /// Street frontage in feet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontage: Option<f64>,
    /// Lot width in feet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Grade in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slope: Option<f64>,
}

/// Lot condition that triggers an exception rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPredicate {
    CornerLot,
    FlagLot,
    MinFrontage,
    SteepSlope,
}

impl ExceptionPredicate {
    /// Evaluate against a lot context with the default thresholds.
    ///
    /// Absent fields evaluate false: no exception is silently granted
    /// because the parcel data was incomplete.
    pub fn evaluate(&self, context: &LotContext) -> bool {
        match self {
            Self::CornerLot => context.corner == Some(true),
            Self::FlagLot => context.flag == Some(true),
            Self::MinFrontage => below_frontage(context, DEFAULT_FRONTAGE_THRESHOLD),
            Self::SteepSlope => above_slope(context, DEFAULT_SLOPE_THRESHOLD),
        }
    }
}

/// Whether the lot's frontage is below `threshold` feet.
pub fn below_frontage(context: &LotContext, threshold: f64) -> bool {
    context.frontage.is_some_and(|f| f < threshold)
}

/// Whether the lot's grade exceeds `threshold` percent.
pub fn above_slope(context: &LotContext, threshold: f64) -> bool {
    context.slope.is_some_and(|s| s > threshold)
}

/// One per-intent adjustment carried by an exception rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionAdjustment {
    pub intent: Intent,
    pub op: AdjustmentOp,
    pub value: f64,
    pub unit: String,
}

/// A lot-condition-triggered adjustment rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionRule {
    pub id: String,
    pub predicate: ExceptionPredicate,
    pub adjustments: Vec<ExceptionAdjustment>,
    pub citations: Vec<CodeCitation>,
}

/// Result of applying exception rules to an answer.
#[derive(Debug, Clone)]
pub struct ExceptionOutcome {
    pub answer: Answer,
    /// IDs of exception rules that applied, in rule-list order.
    pub applied: Vec<String>,
    pub steps: Vec<TraceStep>,
    /// Whether an exception asserted the value via `replace`.
    pub replaced: bool,
}

/// Apply every triggered exception rule's adjustment for the current intent.
///
/// Rules apply in list order and compound on the running value. A rule
/// contributes at most one adjustment (the first matching the intent). Op
/// semantics match overlays: a `min` constraint clamps upward, a `max`
/// constraint clamps downward. Applied rules' citations are prepended.
pub fn apply_exception_rules(
    answer: &Answer,
    rules: &[ExceptionRule],
    context: &LotContext,
) -> ExceptionOutcome {
    let Some(base_value) = answer.value else {
        return ExceptionOutcome {
            answer: answer.clone(),
            applied: Vec::new(),
            steps: Vec::new(),
            replaced: false,
        };
    };
    if answer.status != AnswerStatus::Answered {
        return ExceptionOutcome {
            answer: answer.clone(),
            applied: Vec::new(),
            steps: Vec::new(),
            replaced: false,
        };
    }

    let mut value = base_value;
    let mut applied = Vec::new();
    let mut steps = Vec::new();
    let mut citations = answer.citations.clone();
    let mut replaced = false;

    for rule in rules {
        if !rule.predicate.evaluate(context) {
            continue;
        }
        let Some(adjustment) = rule.adjustments.iter().find(|a| a.intent == answer.intent)
        else {
            continue;
        };

        let result = adjustment.op.apply(value, adjustment.value);
        steps.push(TraceStep::exception(
            &rule.id,
            adjustment.op,
            adjustment.value,
            result,
            rule.citations.clone(),
        ));
        applied.push(rule.id.clone());
        citations.splice(0..0, rule.citations.iter().cloned());
        if adjustment.op == AdjustmentOp::Replace {
            replaced = true;
        }
        value = result;
    }

    if applied.is_empty() {
        return ExceptionOutcome {
            answer: answer.clone(),
            applied,
            steps,
            replaced,
        };
    }

    let unit = answer.unit.clone().unwrap_or_default();
    let mut adjusted =
        Answer::answered(answer.intent, value, &unit, citations, Provenance::Exception);
    adjusted.rationale = answer.rationale.clone();
    adjusted.answer_id = answer.answer_id.clone();

    ExceptionOutcome {
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
            Intent::SideSetback,
            value,
            "ft",
            vec![CodeCitation::new("austin_ldc_2024", "25-2-492")],
            Provenance::Rule,
        )
    }

    fn rule(id: &str, predicate: ExceptionPredicate, op: AdjustmentOp, value: f64) -> ExceptionRule {
        ExceptionRule {
            id: id.to_string(),
            predicate,
            adjustments: vec![ExceptionAdjustment {
                intent: Intent::SideSetback,
                op,
                value,
                unit: "ft".to_string(),
            }],
            citations: vec![CodeCitation::new("austin_ldc_2024", "25-2-515")],
        }
    }

    #[test]
    fn corner_lot_predicate() {
        let ctx = LotContext {
            corner: Some(true),
            ..Default::default()
        };
        assert!(ExceptionPredicate::CornerLot.evaluate(&ctx));
        assert!(!ExceptionPredicate::CornerLot.evaluate(&LotContext::default()));
    }

    #[test]
    fn flag_lot_predicate() {
        let ctx = LotContext {
            flag: Some(true),
            ..Default::default()
        };
        assert!(ExceptionPredicate::FlagLot.evaluate(&ctx));
        assert!(!ExceptionPredicate::FlagLot.evaluate(&LotContext::default()));
    }

    #[test]
    fn min_frontage_predicate_thresholds() {
        let narrow = LotContext {
            frontage: Some(40.0),
            ..Default::default()
        };
        let wide = LotContext {
            frontage: Some(60.0),
            ..Default::default()
        };
        let at = LotContext {
            frontage: Some(50.0),
            ..Default::default()
        };
        assert!(ExceptionPredicate::MinFrontage.evaluate(&narrow));
        assert!(!ExceptionPredicate::MinFrontage.evaluate(&wide));
        assert!(!ExceptionPredicate::MinFrontage.evaluate(&at));
    }

    #[test]
    fn steep_slope_predicate_thresholds() {
        let steep = LotContext {
            slope: Some(20.0),
            ..Default::default()
        };
        let flat = LotContext {
            slope: Some(10.0),
            ..Default::default()
        };
        let at = LotContext {
            slope: Some(15.0),
            ..Default::default()
        };
        assert!(ExceptionPredicate::SteepSlope.evaluate(&steep));
        assert!(!ExceptionPredicate::SteepSlope.evaluate(&flat));
        assert!(!ExceptionPredicate::SteepSlope.evaluate(&at));
    }

    #[test]
    fn missing_context_fields_fail_closed() {
        let empty = LotContext::default();
        for predicate in [
            ExceptionPredicate::CornerLot,
            ExceptionPredicate::FlagLot,
            ExceptionPredicate::MinFrontage,
            ExceptionPredicate::SteepSlope,
        ] {
            assert!(!predicate.evaluate(&empty), "{predicate:?}");
        }
    }

    #[test]
    fn triggered_rule_applies_adjustment() {
        let ctx = LotContext {
            corner: Some(true),
            ..Default::default()
        };
        let out = apply_exception_rules(
            &base(5.0),
            &[rule("corner-side", ExceptionPredicate::CornerLot, AdjustmentOp::Add, 5.0)],
            &ctx,
        );
        assert_eq!(out.answer.value, Some(10.0));
        assert_eq!(out.answer.provenance, Provenance::Exception);
        assert_eq!(out.applied, vec!["corner-side"]);
        assert_eq!(out.steps.len(), 1);
    }

    #[test]
    fn untriggered_rule_leaves_answer_unchanged() {
        let out = apply_exception_rules(
            &base(5.0),
            &[rule("corner-side", ExceptionPredicate::CornerLot, AdjustmentOp::Add, 5.0)],
            &LotContext::default(),
        );
        assert_eq!(out.answer, base(5.0));
        assert!(out.applied.is_empty());
    }

    #[test]
    fn multiple_rules_compound_in_order() {
        let ctx = LotContext {
            corner: Some(true),
            slope: Some(20.0),
            ..Default::default()
        };
        // corner adds 5 (→10), steep slope floors at 12 (→12).
        let out = apply_exception_rules(
            &base(5.0),
            &[
                rule("corner", ExceptionPredicate::CornerLot, AdjustmentOp::Add, 5.0),
                rule("slope", ExceptionPredicate::SteepSlope, AdjustmentOp::Min, 12.0),
            ],
            &ctx,
        );
        assert_eq!(out.answer.value, Some(12.0));
        assert_eq!(out.applied, vec!["corner", "slope"]);
        assert_eq!(out.steps.len(), 2);
    }

    #[test]
    fn rule_without_matching_intent_skipped() {
        let ctx = LotContext {
            corner: Some(true),
            ..Default::default()
        };
        let mut r = rule("corner", ExceptionPredicate::CornerLot, AdjustmentOp::Add, 5.0);
        r.adjustments[0].intent = Intent::MaxHeight;
        let out = apply_exception_rules(&base(5.0), &[r], &ctx);
        assert!(out.applied.is_empty());
    }

    #[test]
    fn replace_sets_flag() {
        let ctx = LotContext {
            flag: Some(true),
            ..Default::default()
        };
        let out = apply_exception_rules(
            &base(5.0),
            &[rule("flag", ExceptionPredicate::FlagLot, AdjustmentOp::Replace, 20.0)],
            &ctx,
        );
        assert_eq!(out.answer.value, Some(20.0));
        assert!(out.replaced);
    }

    #[test]
    fn citations_prepended() {
        let ctx = LotContext {
            corner: Some(true),
            ..Default::default()
        };
        let out = apply_exception_rules(
            &base(5.0),
            &[rule("corner", ExceptionPredicate::CornerLot, AdjustmentOp::Add, 5.0)],
            &ctx,
        );
        assert_eq!(out.answer.citations[0].section, "25-2-515");
        assert_eq!(out.answer.citations[1].section, "25-2-492");
    }
}
