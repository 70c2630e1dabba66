//! Static rule tables: (jurisdiction, zone, intent) → base answer.
//!
//! Zone strings are normalised (separators stripped, uppercased) before
//! lookup, so "SF-3", "sf 3", and "SF3" all hit the same row. An unmodeled
//! (zone, intent) pair is not an error: lookup returns a `needs_review`
//! answer carrying a generic citation at the jurisdiction's general
//! district section.

use std::collections::HashMap;

use crate::answer::{Answer, CodeCitation, Intent, Provenance};

/// Normalise a zone string for table lookup.
///
/// "SF-3" → "SF3", "sf_3" → "SF3", "  mf 4 " → "MF4".
pub fn normalize_zone(zone: &str) -> String {
    zone.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .collect::<String>()
        .to_ascii_uppercase()
}

/// One modeled rule row.
#[derive(Debug, Clone)]
struct RuleDefinition {
    value: f64,
    unit: &'static str,
    rationale: String,
    citations: Vec<CodeCitation>,
}

/// Static per-jurisdiction rule table.
///
/// Pure in-memory lookup; rows are immutable once the table is built.
pub struct RuleTable {
    rules: HashMap<(String, String, Intent), RuleDefinition>,
    /// jurisdiction → (code_id, general district section) used for the
    /// generic needs_review citation.
    fallback_sections: HashMap<String, (String, String)>,
}

impl RuleTable {
    fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            fallback_sections: HashMap::new(),
        }
    }

    /// Table seeded with the built-in Austin LDC 2024 rules.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.fallback_sections.insert(
            "austin".to_string(),
            ("austin_ldc_2024".to_string(), "25-2-492".to_string()),
        );
        seed_austin(&mut table);
        table
    }

    fn insert(
        &mut self,
        jurisdiction: &str,
        zone: &str,
        intent: Intent,
        value: f64,
        unit: &'static str,
        rationale: String,
        citation: CodeCitation,
    ) {
        self.rules.insert(
            (jurisdiction.to_string(), normalize_zone(zone), intent),
            RuleDefinition {
                value,
                unit,
                rationale,
                citations: vec![citation],
            },
        );
    }

    /// Look up the base answer for a zone and intent.
    ///
    /// Always returns an answer: a modeled pair yields `answered`, an
    /// unmodeled pair yields `needs_review` with the jurisdiction's generic
    /// citation. Never panics, never errors.
    pub fn lookup(&self, zone: &str, intent: Intent, jurisdiction_id: &str) -> Answer {
        let key = (
            jurisdiction_id.to_string(),
            normalize_zone(zone),
            intent,
        );
        if let Some(def) = self.rules.get(&key) {
            return Answer::answered(
                intent,
                def.value,
                def.unit,
                def.citations.clone(),
                Provenance::Rule,
            )
            .with_rationale(&def.rationale);
        }

        // Unmodeled zone/intent: sentinel, not an error.
        let (code_id, section) = self
            .fallback_sections
            .get(jurisdiction_id)
            .cloned()
            .unwrap_or_else(|| (jurisdiction_id.to_string(), String::from("general")));
        Answer::needs_review(
            intent,
            vec![
                CodeCitation::new(&code_id, &section)
                    .with_snippet("See applicable district regulations"),
            ],
            Provenance::Rule,
        )
    }

    /// Answers for all six intents for a zone.
    pub fn answers_for_zone(&self, zone: &str, jurisdiction_id: &str) -> Vec<Answer> {
        Intent::ALL
            .iter()
            .map(|intent| self.lookup(zone, *intent, jurisdiction_id))
            .collect()
    }
}

/// Austin Land Development Code 2024, single-family districts.
fn seed_austin(table: &mut RuleTable) {
    let cite = |section: &str, anchor: &str, snippet: &str| {
        CodeCitation::new("austin_ldc_2024", section)
            .with_anchor(anchor)
            .with_snippet(snippet)
    };

    // (zone, section, front, side, rear, height, coverage, lot_size)
    // SF-1 large lot, SF-2 small lot, SF-3 standard lot.
    struct SfDistrict {
        zone: &'static str,
        label: &'static str,
        section: &'static str,
        front: f64,
        side: f64,
        rear: f64,
        coverage: f64,
        lot_size: f64,
    }

    let districts = [
        SfDistrict {
            zone: "SF1",
            label: "SF-1",
            section: "25-2-490",
            front: 40.0,
            side: 10.0,
            rear: 25.0,
            coverage: 35.0,
            lot_size: 8750.0,
        },
        SfDistrict {
            zone: "SF2",
            label: "SF-2",
            section: "25-2-491",
            front: 25.0,
            side: 5.0,
            rear: 10.0,
            coverage: 40.0,
            lot_size: 5750.0,
        },
        SfDistrict {
            zone: "SF3",
            label: "SF-3",
            section: "25-2-492",
            front: 25.0,
            side: 5.0,
            rear: 10.0,
            coverage: 40.0,
            lot_size: 5750.0,
        },
    ];

    for d in districts {
        table.insert(
            "austin",
            d.zone,
            Intent::FrontSetback,
            d.front,
            "ft",
            format!("Minimum front yard setback for {}", d.label),
            cite(
                d.section,
                "(B)(1)",
                &format!("Front yard: {} feet minimum", d.front),
            ),
        );
        table.insert(
            "austin",
            d.zone,
            Intent::SideSetback,
            d.side,
            "ft",
            format!("Minimum interior side yard setback for {}", d.label),
            cite(
                d.section,
                "(B)(2)",
                &format!("Interior side yard: {} feet minimum", d.side),
            ),
        );
        table.insert(
            "austin",
            d.zone,
            Intent::RearSetback,
            d.rear,
            "ft",
            format!("Minimum rear yard setback for {}", d.label),
            cite(
                d.section,
                "(B)(3)",
                &format!("Rear yard: {} feet minimum", d.rear),
            ),
        );
        table.insert(
            "austin",
            d.zone,
            Intent::MaxHeight,
            35.0,
            "ft",
            format!("Maximum building height for {}", d.label),
            cite(d.section, "(C)", "Maximum height: 35 feet"),
        );
        table.insert(
            "austin",
            d.zone,
            Intent::LotCoverage,
            d.coverage,
            "percent",
            format!("Maximum lot coverage for {}", d.label),
            cite(
                d.section,
                "(D)",
                &format!("Maximum lot coverage: {} percent", d.coverage),
            ),
        );
        table.insert(
            "austin",
            d.zone,
            Intent::MinLotSize,
            d.lot_size,
            "sqft",
            format!("Minimum lot size for {}", d.label),
            cite(
                d.section,
                "(A)",
                &format!("Minimum lot size: {} square feet", d.lot_size),
            ),
        );
    }
}
