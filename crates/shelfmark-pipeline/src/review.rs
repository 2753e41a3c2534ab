//! Quality review of processed batches.
//!
//! - per item: a score in `[0, 1]` plus the issues that lowered it
//! - per batch: totals, per-strategy counts, score buckets and recommendations
//!
//! The review is advisory. It never changes an outcome, it only reports on it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use shelfmark_resolver::Strategy;
use shelfmark_synth::EnrichmentStatus;

use crate::{ItemOutcome, ItemStatus};

pub const HIGH_QUALITY: f64 = 0.8;
pub const LOW_QUALITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub min_title_chars: usize,
    pub max_title_chars: usize,
    pub min_confidence: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_title_chars: 5,
            max_title_chars: 80,
            min_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemQuality {
    pub score: f64,
    pub issues: Vec<String>,
}

/// Score one outcome. Unmatched items have no title and score 0.
pub fn assess(outcome: &ItemOutcome, thresholds: &QualityThresholds) -> ItemQuality {
    let Some(title) = outcome.title.as_deref() else {
        return ItemQuality {
            score: 0.0,
            issues: vec!["no title produced".to_string()],
        };
    };

    let mut score: f64 = 1.0;
    let mut issues = Vec::new();

    let len = title.chars().count();
    if len < thresholds.min_title_chars {
        score -= 0.3;
        issues.push(format!("title too short ({len} chars)"));
    } else if len > thresholds.max_title_chars {
        score -= 0.2;
        issues.push(format!("title too long ({len} chars)"));
    }

    if title.trim().to_lowercase() == outcome.raw_title.trim().to_lowercase() {
        score -= 0.2;
        issues.push("title is identical to the input".to_string());
    }

    match outcome.enrichment {
        Some(EnrichmentStatus::Success) => score += 0.1,
        Some(EnrichmentStatus::Fallback | EnrichmentStatus::Failed) => {
            score -= 0.3;
            issues.push("enrichment failed".to_string());
        }
        None => {}
    }

    if let Some(confidence) = outcome.confidence() {
        if confidence < thresholds.min_confidence {
            score -= 0.2;
            issues.push(format!("low category confidence ({confidence:.2})"));
        }
    }

    ItemQuality {
        score: score.clamp(0.0, 1.0),
        issues,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemIssue {
    pub item: usize,
    pub raw_title: String,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReview {
    pub version: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub unmatched: usize,
    pub needs_review: usize,
    pub enrichment_used: usize,
    pub enrichment_failed: usize,
    pub strategy_counts: BTreeMap<Strategy, usize>,
    pub average_quality: Option<f64>,
    pub average_confidence: Option<f64>,
    pub high_quality: usize,
    pub low_quality: usize,
    pub issues: Vec<ItemIssue>,
    pub recommendations: Vec<String>,
}

impl BatchReview {
    pub fn from_outcomes(outcomes: &[ItemOutcome]) -> Self {
        Self::with_thresholds(outcomes, &QualityThresholds::default())
    }

    pub fn with_thresholds(outcomes: &[ItemOutcome], thresholds: &QualityThresholds) -> Self {
        let total = outcomes.len();
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        let unmatched = outcomes
            .iter()
            .filter(|o| o.status == ItemStatus::NoMatch)
            .count();
        let needs_review = outcomes
            .iter()
            .filter(|o| o.status == ItemStatus::NeedsManualReview)
            .count();
        let enrichment_used = outcomes.iter().filter(|o| o.enrichment.is_some()).count();
        let enrichment_failed = outcomes
            .iter()
            .filter(|o| matches!(o.enrichment, Some(s) if s != EnrichmentStatus::Success))
            .count();

        let mut strategy_counts = BTreeMap::new();
        for m in outcomes.iter().filter_map(|o| o.resolution.as_ref()) {
            *strategy_counts.entry(m.strategy).or_insert(0) += 1;
        }

        let mut scores = Vec::new();
        let mut issues = Vec::new();
        for o in outcomes.iter().filter(|o| o.is_success()) {
            let q = assess(o, thresholds);
            scores.push(q.score);
            if !q.issues.is_empty() {
                issues.push(ItemIssue {
                    item: o.item,
                    raw_title: o.raw_title.clone(),
                    issues: q.issues,
                });
            }
        }
        let confidences: Vec<f64> = outcomes.iter().filter_map(ItemOutcome::confidence).collect();

        let high_quality = scores.iter().filter(|s| **s >= HIGH_QUALITY).count();
        let low_quality = scores.iter().filter(|s| **s < LOW_QUALITY).count();

        let mut review = Self {
            version: "batch_review_v1".to_string(),
            total,
            successful,
            failed: total - successful,
            unmatched,
            needs_review,
            enrichment_used,
            enrichment_failed,
            strategy_counts,
            average_quality: mean(&scores),
            average_confidence: mean(&confidences),
            high_quality,
            low_quality,
            issues,
            recommendations: Vec::new(),
        };
        review.recommendations = review.recommend();
        review
    }

    pub fn success_rate(&self) -> f64 {
        ratio(self.successful, self.total)
    }

    pub fn enrichment_failure_rate(&self) -> f64 {
        ratio(self.enrichment_failed, self.enrichment_used)
    }

    fn recommend(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.total == 0 {
            return out;
        }
        if self.success_rate() < 0.8 {
            out.push(format!(
                "Low success rate ({:.0}%): review unmatched titles and extend the taxonomy or keyword rules",
                self.success_rate() * 100.0
            ));
        }
        if self.enrichment_used > 0 && self.enrichment_failure_rate() > 0.3 {
            out.push(format!(
                "Enrichment failed for {:.0}% of items: check the language-model backend configuration",
                self.enrichment_failure_rate() * 100.0
            ));
        }
        if self.average_quality.is_some_and(|q| q < 0.7) {
            out.push("Average title quality is below 0.7: review the naming templates".to_string());
        }
        if self.low_quality > self.high_quality {
            out.push(format!(
                "More low-quality ({}) than high-quality ({}) titles: inspect the listed issues",
                self.low_quality, self.high_quality
            ));
        }
        if out.is_empty() {
            out.push("Processing looks good; no action needed".to_string());
        }
        out
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub fn render_review_text(r: &BatchReview) -> String {
    let mut out = String::new();
    out.push_str("review\n");
    out.push_str(&format!(
        "  items: total={} successful={} failed={} unmatched={} needs_review={}\n",
        r.total, r.successful, r.failed, r.unmatched, r.needs_review
    ));
    out.push_str(&format!("  success rate: {:.1}%\n", r.success_rate() * 100.0));
    if r.enrichment_used > 0 {
        out.push_str(&format!(
            "  enrichment: used={} failed={}\n",
            r.enrichment_used, r.enrichment_failed
        ));
    }
    if let Some(q) = r.average_quality {
        out.push_str(&format!(
            "  quality: average={q:.2} high={} low={}\n",
            r.high_quality, r.low_quality
        ));
    }
    if let Some(c) = r.average_confidence {
        out.push_str(&format!("  confidence: average={c:.2}\n"));
    }

    if !r.strategy_counts.is_empty() {
        out.push_str("\nstrategies\n");
        for (strategy, count) in &r.strategy_counts {
            out.push_str(&format!("  {strategy}: {count}\n"));
        }
    }

    if !r.issues.is_empty() {
        out.push_str("\nissues\n");
        for issue in &r.issues {
            out.push_str(&format!(
                "  - #{} {}: {}\n",
                issue.item,
                issue.raw_title,
                issue.issues.join("; ")
            ));
        }
    }

    out.push_str("\nrecommendations\n");
    for rec in &r.recommendations {
        out.push_str(&format!("  - {rec}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shelfmark_extract::extract_descriptor;
    use shelfmark_resolver::MatchResult;
    use shelfmark_taxonomy::TaxonomyRecord;

    fn outcome(raw: &str, title: Option<&str>, confidence: f64) -> ItemOutcome {
        let record = TaxonomyRecord::new("FERRETERIA", "HERRAJES", "CHAPAS", "Tipo + Marca", "");
        let matched = title.is_some();
        ItemOutcome {
            item: 1,
            raw_title: raw.to_string(),
            descriptor: extract_descriptor(raw),
            resolution: matched.then(|| MatchResult {
                record,
                confidence,
                strategy: Strategy::Keyword,
                raw_score: 2.0,
                detail: None,
            }),
            title: title.map(str::to_string),
            title_source: None,
            label: title.map(str::to_string),
            label_step: None,
            enrichment: None,
            research_confidence: None,
            status: if matched {
                ItemStatus::Success
            } else {
                ItemStatus::NoMatch
            },
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_clean_item_scores_full() {
        let q = assess(
            &outcome("CHAPA BARI", Some("Chapa Bari Cromo"), 0.9),
            &QualityThresholds::default(),
        );
        assert_relative_eq!(q.score, 1.0);
        assert!(q.issues.is_empty());
    }

    #[test]
    fn test_penalties_stack() {
        let mut o = outcome("Chapa", Some("CHAPA"), 0.1);
        o.enrichment = Some(EnrichmentStatus::Failed);
        // identical -0.2, enrichment -0.3, confidence -0.2
        let q = assess(&o, &QualityThresholds::default());
        assert_relative_eq!(q.score, 0.3, epsilon = 1e-9);
        assert_eq!(q.issues.len(), 3);

        let short = assess(&outcome("x", Some("Ab"), 0.9), &QualityThresholds::default());
        assert_relative_eq!(short.score, 0.7, epsilon = 1e-9);
    }

    #[test]
    fn test_enrichment_bonus_is_clamped() {
        let mut o = outcome("CHAPA BARI", Some("Chapa Bari Cromo"), 0.9);
        o.enrichment = Some(EnrichmentStatus::Success);
        assert_relative_eq!(assess(&o, &QualityThresholds::default()).score, 1.0);
    }

    #[test]
    fn test_batch_review_counts_and_recommendations() {
        let outcomes = vec![
            outcome("CHAPA BARI", Some("Chapa Bari Cromo"), 0.9),
            outcome("zzzz", None, 0.0),
        ];
        let review = BatchReview::from_outcomes(&outcomes);
        assert_eq!(review.total, 2);
        assert_eq!(review.successful, 1);
        assert_eq!(review.unmatched, 1);
        assert_eq!(review.strategy_counts.get(&Strategy::Keyword), Some(&1));
        assert_eq!(review.high_quality, 1);
        assert!(review.recommendations[0].starts_with("Low success rate (50%)"));

        let text = render_review_text(&review);
        assert!(text.contains("KEYWORD: 1"));
        assert!(text.contains("success rate: 50.0%"));
    }

    #[test]
    fn test_empty_batch() {
        let review = BatchReview::from_outcomes(&[]);
        assert_eq!(review.average_quality, None);
        assert!(review.recommendations.is_empty());
    }
}
