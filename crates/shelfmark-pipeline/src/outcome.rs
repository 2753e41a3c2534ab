use serde::Serialize;

use shelfmark_extract::ProductDescriptor;
use shelfmark_label::LabelStep;
use shelfmark_resolver::MatchResult;
use shelfmark_synth::EnrichmentStatus;

/// Where the final title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    Generative,
    Template,
    /// Template join after the generative backend failed.
    TemplateFallback,
}

impl TitleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleSource::Generative => "generative",
            TitleSource::Template => "template",
            TitleSource::TemplateFallback => "template_fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Success,
    /// Title produced, but the category match is weak.
    NeedsManualReview,
    /// No strategy accepted a category; no title or label.
    NoMatch,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Success => "success",
            ItemStatus::NeedsManualReview => "needs_manual_review",
            ItemStatus::NoMatch => "no_match",
        }
    }
}

/// Everything the pipeline produced for one input title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    /// 1-based position in the batch.
    pub item: usize,
    pub raw_title: String,
    pub descriptor: ProductDescriptor,
    pub resolution: Option<MatchResult>,
    pub title: Option<String>,
    pub title_source: Option<TitleSource>,
    pub label: Option<String>,
    pub label_step: Option<LabelStep>,
    pub enrichment: Option<EnrichmentStatus>,
    pub research_confidence: Option<f64>,
    pub status: ItemStatus,
    /// Non-fatal problems (backend failures, fallbacks) and the reason for
    /// a missing title.
    pub errors: Vec<String>,
}

impl ItemOutcome {
    /// A title and label were produced.
    pub fn is_success(&self) -> bool {
        self.status != ItemStatus::NoMatch
    }

    pub fn confidence(&self) -> Option<f64> {
        self.resolution.as_ref().map(|m| m.confidence)
    }

    /// `(raw_title, match, title, label)` as consumed by batch drivers.
    pub fn as_tuple(&self) -> (&str, Option<&MatchResult>, Option<&str>, Option<&str>) {
        (
            &self.raw_title,
            self.resolution.as_ref(),
            self.title.as_deref(),
            self.label.as_deref(),
        )
    }
}
