//! Manually curated overrides.
//!
//! An override is a hand-entered correction to an automatically computed
//! value, with its own legal citation. Overrides may be scoped to a whole
//! district or to a single parcel (by APN), and may carry an expiry date
//! after which they are inactive everywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answer::{Answer, CodeCitation, Intent, Provenance};
use crate::trace::TraceStep;

/// Scope of an override. Legacy overrides carry no scope and behave as
/// district-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideScope {
    District,
    Parcel,
}

/// A curated correction for one (district, intent) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Override {
    pub district: String,
    pub intent: Intent,
    pub value: f64,
    pub unit: String,
    pub citation: CodeCitation,
    pub rationale: String,
    /// Inactive strictly after this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<OverrideScope>,
    /// Required when scope is parcel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apn: Option<String>,
}

impl Override {
    /// Stable ID used in trace steps: "{district}:{intent}[:{apn}]".
    pub fn trace_id(&self) -> String {
        match &self.apn {
            Some(apn) if self.scope == Some(OverrideScope::Parcel) => {
                format!("{}:{}:{apn}", self.district, self.intent)
            }
            _ => format!("{}:{}", self.district, self.intent),
        }
    }
}

/// Select the override to apply for a (district, intent) pair, if any.
///
/// Expired overrides are excluded outright. Parcel-scoped overrides match
/// only on exact APN equality (no normalisation). A parcel override beats a
/// district override; among multiple district overrides the first in input
/// order wins — administrative data is expected to keep one override per
/// (district, intent), and the tiebreak only makes duplicates deterministic.
pub fn select_override<'a>(
    overrides: &'a [Override],
    district: &str,
    intent: Intent,
    apn: Option<&str>,
    now: DateTime<Utc>,
) -> Option<&'a Override> {
    let applicable: Vec<&Override> = overrides
        .iter()
        .filter(|o| {
            if o.expires.is_some_and(|expires| expires < now) {
                return false;
            }
            if o.district != district || o.intent != intent {
                return false;
            }
            match o.scope {
                Some(OverrideScope::Parcel) => o.apn.as_deref() == apn && apn.is_some(),
                Some(OverrideScope::District) | None => true,
            }
        })
        .collect();

    applicable
        .iter()
        .find(|o| o.scope == Some(OverrideScope::Parcel))
        .or_else(|| {
            applicable
                .iter()
                .find(|o| matches!(o.scope, Some(OverrideScope::District) | None))
        })
        .copied()
}

/// Apply an override to an answer: a hard replace of value and unit, with
/// the override citation moved to the front of the citation list.
pub fn apply_override(answer: &Answer, selected: &Override) -> (Answer, TraceStep) {
    let mut citations = Vec::with_capacity(answer.citations.len() + 1);
    citations.push(selected.citation.clone());
    citations.extend(answer.citations.iter().cloned());

    let mut merged = Answer::answered(
        answer.intent,
        selected.value,
        &selected.unit,
        citations,
        Provenance::Override,
    )
    .with_rationale(&selected.rationale);
    merged.answer_id = answer.answer_id.clone();

    let step = TraceStep::override_step(
        &selected.trace_id(),
        selected.value,
        vec![selected.citation.clone()],
    );
    (merged, step)
}
