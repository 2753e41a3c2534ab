//! Pattern-based category override
//!
//! Floor/wall tile titles are notoriously misread by keyword scoring (a
//! pattern name like BAMBOO says nothing about ceramics). When the raw title
//! names a known tile pattern, or carries a characteristic tile size, the
//! descriptor is redirected to the configured tile family.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use shelfmark_extract::{find_tile_pattern, vocabulary::TILE_PATTERN_LEXICON};
use shelfmark_taxonomy::{TaxonomyRecord, TaxonomyStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOverrideConfig {
    pub enabled: bool,
    pub department: String,
    pub family: String,
    /// Category substring identifying the family's generic record.
    pub generic_marker: String,
    /// Pattern name (whole word in the title) → category name.
    pub lexicon: Vec<(String, String)>,
    /// Characteristic sizes, matched in either order.
    pub sizes: Vec<(u32, u32)>,
    pub pattern_confidence: f64,
    pub generic_confidence: f64,
}

impl Default for PatternOverrideConfig {
    fn default() -> Self {
        let lexicon = TILE_PATTERN_LEXICON
            .iter()
            .map(|(p, c)| ((*p).to_string(), (*c).to_string()))
            .collect();

        Self {
            enabled: true,
            department: "REVESTIMIENTOS".into(),
            family: "CERAMICA DE PISOS".into(),
            generic_marker: "BALDOSA".into(),
            lexicon,
            sizes: vec![
                (20, 20),
                (21, 31),
                (25, 40),
                (30, 30),
                (29, 36),
                (33, 33),
                (40, 40),
                (45, 45),
                (60, 60),
                (80, 80),
                (20, 120),
            ],
            pattern_confidence: 0.95,
            generic_confidence: 0.85,
        }
    }
}

fn size_pair_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*[xX×]\s*(\d+)").ok())
        .as_ref()
}

/// What in the title triggered the override.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternTrigger {
    /// Pattern name and its category.
    Named { pattern: String, category: String },
    /// Characteristic size only.
    Size { width: u32, height: u32 },
}

impl PatternTrigger {
    pub fn describe(&self) -> String {
        match self {
            PatternTrigger::Named { pattern, category } => format!("pattern {pattern} → {category}"),
            PatternTrigger::Size { width, height } => format!("tile size {width}x{height}"),
        }
    }
}

/// First whole word of `title` that names a pattern of `config.lexicon`.
pub fn tile_pattern_name(title: &str, config: &PatternOverrideConfig) -> Option<String> {
    find_tile_pattern(title, |t| config.lexicon.iter().any(|(p, _)| p == t))
}

/// Pattern names win over sizes; the first lexicon hit in title order wins.
pub fn detect_trigger(title: &str, config: &PatternOverrideConfig) -> Option<PatternTrigger> {
    if let Some(pattern) = tile_pattern_name(title, config) {
        if let Some((_, category)) = config.lexicon.iter().find(|(p, _)| *p == pattern) {
            return Some(PatternTrigger::Named {
                pattern,
                category: category.clone(),
            });
        }
    }

    size_pair_re()?
        .captures_iter(title)
        .filter_map(|caps| {
            let w: u32 = caps.get(1)?.as_str().parse().ok()?;
            let h: u32 = caps.get(2)?.as_str().parse().ok()?;
            Some((w, h))
        })
        .find(|&(w, h)| {
            config
                .sizes
                .iter()
                .any(|&(a, b)| (a, b) == (w, h) || (a, b) == (h, w))
        })
        .map(|(width, height)| PatternTrigger::Size { width, height })
}

/// Resolved override: the record, its confidence and the trigger.
#[derive(Debug, Clone)]
pub struct PatternHit<'a> {
    pub record: &'a TaxonomyRecord,
    pub confidence: f64,
    pub trigger: PatternTrigger,
}

pub fn apply_override<'a>(
    title: &str,
    store: &'a TaxonomyStore,
    config: &PatternOverrideConfig,
) -> Option<PatternHit<'a>> {
    if !config.enabled {
        return None;
    }
    let trigger = detect_trigger(title, config)?;

    if let PatternTrigger::Named { category, .. } = &trigger {
        if let Some(record) = store.find_exact(&config.department, &config.family, category) {
            return Some(PatternHit {
                record,
                confidence: config.pattern_confidence,
                trigger,
            });
        }
    }

    let marker = config.generic_marker.to_uppercase();
    let record = store.find_in_family(&config.department, &config.family, |r| {
        r.category_key().contains(marker.as_str())
    })?;
    Some(PatternHit {
        record,
        confidence: config.generic_confidence,
        trigger,
    })
}
