//! The resolution pipeline: rule → overlays → exceptions → override →
//! conflict resolution → answer + trace.
//!
//! Each invocation is pure computation over already-loaded definitions:
//! no I/O, no shared state, nothing retained between calls. Callers load
//! overlay/exception/override definitions once per request (see
//! `parcelaw-data`) and pass them in, along with an injected `now` for
//! override expiry checks.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::answer::{Answer, AnswerStatus, Intent};
use crate::conditions::{ExceptionRule, LotContext, apply_exception_rules};
use crate::conflicts::{ConflictSource, SourceKind, resolve_conflicts};
use crate::overlays::{OverlayAdjustment, apply_overlay_adjustments};
use crate::overrides::{Override, apply_override, select_override};
use crate::rules::{RuleTable, normalize_zone};
use crate::trace::{AnswerTrace, TraceError, TraceStep, build_trace};

/// Everything one resolution needs, loaded and validated by the caller.
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    pub district: &'a str,
    pub intent: Intent,
    pub jurisdiction_id: &'a str,
    /// Overlay district IDs active on the parcel.
    pub active_overlays: &'a [String],
    pub overlay_defs: &'a [OverlayAdjustment],
    pub exception_rules: &'a [ExceptionRule],
    pub lot_context: Option<&'a LotContext>,
    pub overrides: &'a [Override],
    pub apn: Option<&'a str>,
    /// Injected clock for override expiry; keeps resolution deterministic.
    pub now: DateTime<Utc>,
}

/// A resolved answer and, when a computation took place, its trace.
///
/// The trace is absent only for an unmodeled (zone, intent) pair, where
/// there is no base value to anchor a computation at.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub answer: Answer,
    pub trace: Option<AnswerTrace>,
    pub conflict_sources: Option<Vec<ConflictSource>>,
    pub conflict_message: Option<String>,
}

/// Resolve one (district, intent) question.
///
/// Layer outputs feed conflict resolution as follows: constraint and
/// additive adjustments compound on the running value and never compete;
/// a `replace` is an independent assertion, so when both the overlay stage
/// and the exception stage replace the value and disagree, the
/// disagreement surfaces as `needs_review`. A matching override is a
/// curated correction and supersedes all automatic sources outright.
pub fn resolve_answer(
    table: &RuleTable,
    req: &ResolveRequest<'_>,
) -> Result<Resolution, TraceError> {
    let district = normalize_zone(req.district);
    let base = table
        .lookup(req.district, req.intent, req.jurisdiction_id)
        .with_answer_id(&district);

    // Unmodeled pair: no base value to compute from. An override can still
    // rescue it; otherwise the needs_review sentinel goes out untouched.
    if base.status != AnswerStatus::Answered {
        if let Some(selected) =
            select_override(req.overrides, &district, req.intent, req.apn, req.now)
        {
            debug!(district = %district, intent = %req.intent, "override rescues unmodeled pair");
            let (merged, _step) = apply_override(&base, selected);
            return Ok(Resolution {
                answer: merged,
                trace: None,
                conflict_sources: None,
                conflict_message: None,
            });
        }
        return Ok(Resolution {
            answer: base,
            trace: None,
            conflict_sources: None,
            conflict_message: None,
        });
    }

    let base_value = base.value.unwrap_or_default();
    let base_unit = base.unit.clone().unwrap_or_default();
    let rule_id = format!("{district}:{}", req.intent);
    let mut steps = vec![TraceStep::rule(
        &rule_id,
        base_value,
        &format!("{base_value}"),
        base.citations.clone(),
    )];

    let overlay_out = apply_overlay_adjustments(&base, req.overlay_defs, req.active_overlays);
    steps.extend(overlay_out.steps.iter().cloned());
    let overlay_value = overlay_out.answer.value.unwrap_or(base_value);

    let default_context = LotContext::default();
    let context = req.lot_context.unwrap_or(&default_context);
    let exception_out = apply_exception_rules(&overlay_out.answer, req.exception_rules, context);
    steps.extend(exception_out.steps.iter().cloned());

    let mut running = exception_out.answer.clone();

    let sources: Vec<ConflictSource> =
        if let Some(selected) =
            select_override(req.overrides, &district, req.intent, req.apn, req.now)
        {
            let (merged, step) = apply_override(&running, selected);
            steps.push(step);
            running = merged;
            vec![
                ConflictSource::new(
                    SourceKind::Override,
                    Some(selected.trace_id().as_str()),
                    selected.value,
                    &selected.unit,
                )
                .with_citations(running.citations.clone()),
            ]
        } else if overlay_out.replaced && exception_out.replaced {
            // Two independent assertions of the value; let the conflict
            // resolver decide whether they agree.
            debug!(
                district = %district,
                intent = %req.intent,
                overlay_value,
                exception_value = exception_out.answer.value,
                "competing replace assertions"
            );
            vec![
                ConflictSource::new(
                    SourceKind::Overlay,
                    Some(overlay_out.applied.join("+").as_str()),
                    overlay_value,
                    &base_unit,
                )
                .with_citations(
                    overlay_out
                        .steps
                        .iter()
                        .flat_map(|s| s.citations.clone())
                        .collect(),
                ),
                ConflictSource::new(
                    SourceKind::Exception,
                    Some(exception_out.applied.join("+").as_str()),
                    exception_out.answer.value.unwrap_or(overlay_value),
                    &base_unit,
                )
                .with_citations(
                    exception_out
                        .steps
                        .iter()
                        .flat_map(|s| s.citations.clone())
                        .collect(),
                ),
            ]
        } else {
            let kind = if !exception_out.applied.is_empty() {
                SourceKind::Exception
            } else if !overlay_out.applied.is_empty() {
                SourceKind::Overlay
            } else {
                SourceKind::Rule
            };
            let id = match kind {
                SourceKind::Rule => rule_id.clone(),
                SourceKind::Overlay => overlay_out.applied.join("+"),
                SourceKind::Exception => exception_out.applied.join("+"),
                SourceKind::Override => unreachable!(),
            };
            vec![
                ConflictSource::new(
                    kind,
                    Some(id.as_str()),
                    running.value.unwrap_or(base_value),
                    running.unit.as_deref().unwrap_or(&base_unit),
                )
                .with_citations(running.citations.clone()),
            ]
        };

    let resolution = resolve_conflicts(req.intent, &sources);
    let mut answer = resolution.answer.with_answer_id(&district);
    if answer.rationale.is_none() {
        answer.rationale = running.rationale.clone();
    }

    let trace = build_trace(&answer, req.jurisdiction_id, &district, steps)?;

    Ok(Resolution {
        answer,
        trace: Some(trace),
        conflict_sources: resolution.conflict_sources,
        conflict_message: resolution.conflict_message,
    })
}

/// Resolve all six intents for a district, e.g. for a full parcel report.
pub fn resolve_all(
    table: &RuleTable,
    req: &ResolveRequest<'_>,
) -> Result<Vec<Resolution>, TraceError> {
    Intent::ALL
        .iter()
        .map(|intent| {
            let per_intent = ResolveRequest {
                intent: *intent,
                ..req.clone()
            };
            resolve_answer(table, &per_intent)
        })
        .collect()
}
