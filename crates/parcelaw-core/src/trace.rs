//! Explanation traces: an ordered, serializable record of every adjustment
//! step applied to reach a final value.
//!
//! Traces are for audit and user-facing explanation: each step records the
//! operation, a human-readable formula, the post-step value, and the
//! citations backing it. Every trace is anchored at the base rule — the
//! builder rejects anything else loudly, since a trace that starts anywhere
//! but the rule would misrepresent the computation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::answer::{Answer, AnswerStatus, CodeCitation, Intent, Provenance};
use crate::overlays::AdjustmentOp;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace must contain at least one step")]
    EmptyTrace,

    #[error("trace must start with a rule step, got {0}")]
    FirstStepNotRule(String),
}

/// Which layer a trace step came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Rule,
    Overlay,
    Exception,
    Override,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Overlay => "overlay",
            Self::Exception => "exception",
            Self::Override => "override",
        }
    }

    fn provenance(&self) -> Provenance {
        match self {
            Self::Rule => Provenance::Rule,
            Self::Overlay => Provenance::Overlay,
            Self::Exception => Provenance::Exception,
            Self::Override => Provenance::Override,
        }
    }
}

/// One recorded adjustment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<AdjustmentOp>,
    /// Human-readable formula, e.g. "max(prev, 30)".
    pub expr: String,
    /// Running value after this step.
    pub value: f64,
    pub citations: Vec<CodeCitation>,
}

/// Formula string for an adjustment op.
fn expr_for(op: AdjustmentOp, x: f64) -> String {
    match op {
        AdjustmentOp::Replace => format!("{x}"),
        AdjustmentOp::Add => format!("prev + {x}"),
        AdjustmentOp::Min => format!("max(prev, {x})"),
        AdjustmentOp::Max => format!("min(prev, {x})"),
    }
}

impl TraceStep {
    /// The anchoring base-rule step.
    pub fn rule(id: &str, value: f64, expr: &str, citations: Vec<CodeCitation>) -> Self {
        Self {
            kind: StepKind::Rule,
            id: id.to_string(),
            op: None,
            expr: expr.to_string(),
            value,
            citations,
        }
    }

    /// An overlay adjustment step.
    pub fn overlay(
        id: &str,
        op: AdjustmentOp,
        adjustment: f64,
        result: f64,
        citations: Vec<CodeCitation>,
    ) -> Self {
        Self {
            kind: StepKind::Overlay,
            id: id.to_string(),
            op: Some(op),
            expr: expr_for(op, adjustment),
            value: result,
            citations,
        }
    }

    /// A lot-exception adjustment step.
    pub fn exception(
        id: &str,
        op: AdjustmentOp,
        adjustment: f64,
        result: f64,
        citations: Vec<CodeCitation>,
    ) -> Self {
        Self {
            kind: StepKind::Exception,
            id: id.to_string(),
            op: Some(op),
            expr: expr_for(op, adjustment),
            value: result,
            citations,
        }
    }

    /// A manual-override step; always a hard replace.
    pub fn override_step(id: &str, value: f64, citations: Vec<CodeCitation>) -> Self {
        Self {
            kind: StepKind::Override,
            id: id.to_string(),
            op: Some(AdjustmentOp::Replace),
            expr: format!("{value}"),
            value,
            citations,
        }
    }
}

/// The full explanation trace for one resolved answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerTrace {
    pub answer_id: Option<String>,
    pub jurisdiction_id: String,
    pub district: String,
    pub intent: Intent,
    pub units: String,
    pub steps: Vec<TraceStep>,
    pub provenance: Provenance,
    /// None exactly when `conflict` is true.
    pub final_value: Option<f64>,
    pub conflict: bool,
}

/// Build a trace from the resolved answer and its recorded steps.
///
/// Errors when `steps` is empty or the first step is not the base rule;
/// both indicate a bug in the caller, not bad input data.
///
/// Provenance comes from the last step, except that a `needs_review` answer
/// is always attributed to `conflict` and carries no final value.
pub fn build_trace(
    answer: &Answer,
    jurisdiction_id: &str,
    district: &str,
    steps: Vec<TraceStep>,
) -> Result<AnswerTrace, TraceError> {
    let first = steps.first().ok_or(TraceError::EmptyTrace)?;
    if first.kind != StepKind::Rule {
        return Err(TraceError::FirstStepNotRule(first.kind.as_str().to_string()));
    }

    let in_review = answer.status == AnswerStatus::NeedsReview;
    let last = steps.last().unwrap_or(first);
    let provenance = if in_review {
        Provenance::Conflict
    } else {
        last.kind.provenance()
    };
    let final_value = if in_review { None } else { answer.value };

    Ok(AnswerTrace {
        answer_id: answer.answer_id.clone(),
        jurisdiction_id: jurisdiction_id.to_string(),
        district: district.to_string(),
        intent: answer.intent,
        units: answer.unit.clone().unwrap_or_default(),
        steps,
        provenance,
        final_value,
        conflict: in_review,
    })
}

impl AnswerTrace {
    /// Render the trace as a human-readable Markdown report.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "## How this was computed: {} in {}\n\n",
            self.intent, self.district
        ));
        out.push_str(&format!("Jurisdiction: `{}`\n\n", self.jurisdiction_id));

        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!(
                "### Step {}: {} `{}`\n\n",
                i + 1,
                step.kind.as_str(),
                step.id
            ));
            if let Some(op) = step.op {
                out.push_str(&format!("- Operation: `{}`\n", op.as_str()));
            }
            out.push_str(&format!("- Formula: `{}`\n", step.expr));
            out.push_str(&format!("- Value: {} {}\n", step.value, self.units));
            for citation in &step.citations {
                let mut line = format!("- Citation: {} §{}", citation.code_id, citation.section);
                if let Some(anchor) = &citation.anchor {
                    line.push_str(&format!(" {anchor}"));
                }
                out.push_str(&line);
                out.push('\n');
                if let Some(snippet) = &citation.snippet {
                    out.push_str(&format!("  > {snippet}\n"));
                }
            }
            out.push('\n');
        }

        if self.conflict {
            out.push_str("**Conflict detected — needs human review.**\n");
        } else if let Some(value) = self.final_value {
            out.push_str(&format!(
                "**Final value: {} {} (from {})**\n",
                value,
                self.units,
                self.provenance.as_str()
            ));
        }
        out
    }
}
