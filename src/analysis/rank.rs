//! Ranking, verdicts and the short justification shown with each result

use crate::analysis::aggregate::ComplexAggregate;
use crate::analysis::filter::parse_build_year;
use crate::analysis::score::ScoreSet;
use crate::ingestion::types::EnrichmentBundle;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Results returned when the caller does not ask for a different cut-off
pub const DEFAULT_TOP_N: usize = 10;

/// Clauses kept in one narrative
const MAX_REASONS: usize = 3;

const FALLBACK_NARRATIVE: &str = "Stable investment option.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    StrongRecommend,
    Recommend,
    Neutral,
    NotRecommended,
}

impl Verdict {
    pub fn from_score(total_score: i32) -> Self {
        match total_score {
            s if s >= 80 => Verdict::StrongRecommend,
            s if s >= 70 => Verdict::Recommend,
            s if s >= 60 => Verdict::Neutral,
            _ => Verdict::NotRecommended,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::StrongRecommend => "strong-recommend",
            Verdict::Recommend => "recommend",
            Verdict::Neutral => "neutral",
            Verdict::NotRecommended => "not-recommended",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Verdict::StrongRecommend => "Investment value is high; buying is recommended.",
            Verdict::Recommend => "A solid option worth positive consideration.",
            Verdict::Neutral => "Average investment value; compare with alternatives.",
            Verdict::NotRecommended => "Investment value is low; look for other options.",
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        state.serialize_field("label", self.label())?;
        state.serialize_field("description", self.description())?;
        state.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub complex: ComplexAggregate,
    pub enrichment: EnrichmentBundle,
    pub scores: ScoreSet,
    pub total_score: i32,
    pub verdict: Verdict,
    pub narrative: String,
}

impl RankedResult {
    pub fn new(
        complex: ComplexAggregate,
        enrichment: EnrichmentBundle,
        scores: ScoreSet,
        current_year: i32,
    ) -> Self {
        let total_score = scores.total();
        let narrative = generate_narrative(&complex, &scores, current_year);
        Self {
            complex,
            enrichment,
            scores,
            total_score,
            verdict: Verdict::from_score(total_score),
            narrative,
        }
    }
}

/// Up to three reasons, in a fixed priority order
pub fn generate_narrative(complex: &ComplexAggregate, scores: &ScoreSet, current_year: i32) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if scores.brand >= 95 {
        reasons.push("tier-1 brand with strong resale liquidity".to_string());
    } else if scores.brand >= 90 {
        reasons.push("premium brand".to_string());
    }

    match parse_build_year(&complex.build_year).map(|year| current_year - year) {
        Some(age) if age <= 5 => reasons.push("newly built with top product quality".to_string()),
        Some(age) if age <= 10 => reasons.push("near-new with good facilities".to_string()),
        Some(age) if age >= 30 => reasons.push("redevelopment potential".to_string()),
        _ => {}
    }

    if scores.location >= 85 {
        reasons.push("core location close to major job centers".to_string());
    } else if scores.location >= 75 {
        reasons.push("excellent location".to_string());
    } else if scores.location >= 65 {
        reasons.push("good location".to_string());
    }

    if scores.education >= 95 {
        reasons.push("top-tier school district".to_string());
    } else if scores.education >= 85 {
        reasons.push("strong school district".to_string());
    }

    if let Some(ratio) = scores.jeonse_ratio {
        if (70.0..=80.0).contains(&ratio) {
            reasons.push(format!("jeonse ratio {ratio}% makes this a good time to buy"));
        } else if ratio >= 80.0 {
            reasons.push(format!("jeonse ratio {ratio}% calls for gap-investment caution"));
        }
    }

    if complex.transaction_count >= 15 {
        reasons.push("active trading keeps liquidity high".to_string());
    }

    if scores.supply >= 85 {
        reasons.push("little new supply, strong demand".to_string());
    }

    if reasons.is_empty() {
        return FALLBACK_NARRATIVE.to_string();
    }

    reasons.truncate(MAX_REASONS);
    capitalize(&format!("{}.", reasons.join(", ")))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Stable sort by total score, highest first, cut to `top_n`
pub fn rank(mut results: Vec<RankedResult>, top_n: usize) -> Vec<RankedResult> {
    results.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    results.truncate(top_n);
    results
}
