//! Core answer types: intents, statuses, citations, and the resolved Answer.

use serde::{Deserialize, Serialize};

/// The category of zoning question being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FrontSetback,
    SideSetback,
    RearSetback,
    MaxHeight,
    LotCoverage,
    MinLotSize,
}

impl Intent {
    /// All intents, in the order they appear in a full-zone report.
    pub const ALL: [Intent; 6] = [
        Intent::FrontSetback,
        Intent::SideSetback,
        Intent::RearSetback,
        Intent::MaxHeight,
        Intent::LotCoverage,
        Intent::MinLotSize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontSetback => "front_setback",
            Self::SideSetback => "side_setback",
            Self::RearSetback => "rear_setback",
            Self::MaxHeight => "max_height",
            Self::LotCoverage => "lot_coverage",
            Self::MinLotSize => "min_lot_size",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front_setback" => Ok(Self::FrontSetback),
            "side_setback" => Ok(Self::SideSetback),
            "rear_setback" => Ok(Self::RearSetback),
            "max_height" => Ok(Self::MaxHeight),
            "lot_coverage" => Ok(Self::LotCoverage),
            "min_lot_size" => Ok(Self::MinLotSize),
            other => Err(format!("unknown intent: {other}")),
        }
    }
}

/// Resolution status of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// A definite value with citations.
    Answered,
    /// Unmodeled data or a genuine conflict between sources.
    NeedsReview,
    /// No source produced a value at all.
    Missing,
}

/// Which resolution layer ultimately determined the final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Rule,
    Overlay,
    Exception,
    Override,
    Conflict,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Overlay => "overlay",
            Self::Exception => "exception",
            Self::Override => "override",
            Self::Conflict => "conflict",
        }
    }
}

/// A reference into a jurisdiction's code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCitation {
    /// e.g. "austin_ldc_2024"
    pub code_id: String,
    /// e.g. "25-2-492"
    pub section: String,
    /// e.g. "(B)(1)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Quoted code text backing the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl CodeCitation {
    pub fn new(code_id: &str, section: &str) -> Self {
        Self {
            code_id: code_id.to_string(),
            section: section.to_string(),
            anchor: None,
            snippet: None,
        }
    }

    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchor = Some(anchor.to_string());
        self
    }

    pub fn with_snippet(mut self, snippet: &str) -> Self {
        self.snippet = Some(snippet.to_string());
        self
    }
}

/// The resolved value for one (district, intent) pair.
///
/// Constructed once per resolution through the per-status constructors and
/// never mutated afterwards. `value`/`unit` are present exactly when
/// `status == Answered`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub intent: Intent,
    pub status: AnswerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub citations: Vec<CodeCitation>,
    pub provenance: Provenance,
    /// Stable key "{district}:{intent}", used for override matching and
    /// feedback correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_id: Option<String>,
}

impl Answer {
    /// A definite answer with a value, unit, and at least one citation.
    pub fn answered(
        intent: Intent,
        value: f64,
        unit: &str,
        citations: Vec<CodeCitation>,
        provenance: Provenance,
    ) -> Self {
        Self {
            intent,
            status: AnswerStatus::Answered,
            value: Some(value),
            unit: Some(unit.to_string()),
            rationale: None,
            citations,
            provenance,
            answer_id: None,
        }
    }

    /// An answer escalated to human review; carries citations but no value.
    pub fn needs_review(
        intent: Intent,
        citations: Vec<CodeCitation>,
        provenance: Provenance,
    ) -> Self {
        Self {
            intent,
            status: AnswerStatus::NeedsReview,
            value: None,
            unit: None,
            rationale: None,
            citations,
            provenance,
            answer_id: None,
        }
    }

    /// No source produced a value.
    pub fn missing(intent: Intent) -> Self {
        Self {
            intent,
            status: AnswerStatus::Missing,
            value: None,
            unit: None,
            rationale: None,
            citations: Vec::new(),
            provenance: Provenance::Rule,
            answer_id: None,
        }
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    /// Attach the stable "{district}:{intent}" key.
    pub fn with_answer_id(mut self, district: &str) -> Self {
        self.answer_id = Some(format!("{district}:{}", self.intent));
        self
    }
}
