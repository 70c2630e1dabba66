//! Deterministic conflict resolution between overlapping sources.
//!
//! Precedence encodes legal authority: an explicit override beats a lot
//! exception, which beats an overlay adjustment, which beats the base rule.
//! Even so, two sources that share a unit but assert different numbers are
//! a genuine legal disagreement, and the engine escalates to human review
//! rather than resolving it silently.

use serde::{Deserialize, Serialize};

use crate::answer::{Answer, CodeCitation, Intent, Provenance};

/// Which resolution layer a conflict source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Rule,
    Overlay,
    Exception,
    Override,
}

impl SourceKind {
    /// Fixed precedence weight; higher wins.
    fn weight(&self) -> u8 {
        match self {
            Self::Override => 5,
            Self::Exception => 4,
            Self::Overlay => 3,
            Self::Rule => 1,
        }
    }

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

    fn label(&self) -> &'static str {
        match self {
            Self::Rule => "Rule",
            Self::Overlay => "Overlay",
            Self::Exception => "Exception",
            Self::Override => "Override",
        }
    }
}

/// One layer's asserted value, fed into conflict resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: f64,
    pub unit: String,
    pub citations: Vec<CodeCitation>,
}

impl ConflictSource {
    pub fn new(kind: SourceKind, id: Option<&str>, value: f64, unit: &str) -> Self {
        Self {
            kind,
            id: id.map(str::to_string),
            value,
            unit: unit.to_string(),
            citations: Vec::new(),
        }
    }

    pub fn with_citations(mut self, citations: Vec<CodeCitation>) -> Self {
        self.citations = citations;
        self
    }
}

/// Outcome of conflict resolution.
#[derive(Debug, Clone)]
pub struct ConflictResolution {
    pub answer: Answer,
    pub has_conflict: bool,
    /// All sources in precedence order, present only on conflict.
    pub conflict_sources: Option<Vec<ConflictSource>>,
    pub conflict_message: Option<String>,
}

/// Resolve overlapping sources for one intent.
///
/// Sorts sources by precedence weight descending (stable: ties keep input
/// order), takes the top source, and scans for sources that share its unit
/// but disagree on the value. Any disagreement escalates to `needs_review`
/// with every source's citations and a summary message; agreement resolves
/// to the top source.
pub fn resolve_conflicts(intent: Intent, sources: &[ConflictSource]) -> ConflictResolution {
    if sources.is_empty() {
        return ConflictResolution {
            answer: Answer::missing(intent),
            has_conflict: false,
            conflict_sources: None,
            conflict_message: None,
        };
    }

    if let [source] = sources {
        return ConflictResolution {
            answer: Answer::answered(
                intent,
                source.value,
                &source.unit,
                source.citations.clone(),
                source.kind.provenance(),
            ),
            has_conflict: false,
            conflict_sources: None,
            conflict_message: None,
        };
    }

    let mut sorted: Vec<ConflictSource> = sources.to_vec();
    sorted.sort_by_key(|s| std::cmp::Reverse(s.kind.weight()));

    let top = sorted[0].clone();
    let conflicting = sorted
        .iter()
        .any(|s| s.unit == top.unit && s.value != top.value);

    if conflicting {
        let message = format!(
            "Conflicting values: {}",
            sorted
                .iter()
                .map(|s| match &s.id {
                    Some(id) => format!("{} ({id}): {} {}", s.kind.as_str(), s.value, s.unit),
                    None => format!("{}: {} {}", s.kind.as_str(), s.value, s.unit),
                })
                .collect::<Vec<_>>()
                .join(", ")
        );
        let citations = sorted.iter().flat_map(|s| s.citations.clone()).collect();
        return ConflictResolution {
            answer: Answer::needs_review(intent, citations, top.kind.provenance()),
            has_conflict: true,
            conflict_sources: Some(sorted),
            conflict_message: Some(message),
        };
    }

    ConflictResolution {
        answer: Answer::answered(
            intent,
            top.value,
            &top.unit,
            top.citations.clone(),
            top.kind.provenance(),
        ),
        has_conflict: false,
        conflict_sources: None,
        conflict_message: None,
    }
}

/// Human-readable conflict summary for display layers.
pub fn format_conflict_message(sources: &[ConflictSource]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = sources
        .iter()
        .map(|s| {
            let label = match (&s.kind, &s.id) {
                (SourceKind::Rule, _) | (SourceKind::Override, _) => s.kind.label().to_string(),
                (_, Some(id)) => format!("{} ({id})", s.kind.label()),
                (_, None) => s.kind.label().to_string(),
            };
            format!("{label}: {} {}", s.value, s.unit)
        })
        .collect();
    format!("Conflicting values from: {}", parts.join(", "))
}
