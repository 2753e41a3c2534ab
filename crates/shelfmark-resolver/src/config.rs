use serde::{Deserialize, Serialize};
use std::path::Path;

use shelfmark_taxonomy::normalize_key;

use crate::keywords::{default_synonyms, SynonymEntry};
use crate::pattern::PatternOverrideConfig;
use crate::rules::{default_bonus_rules, default_penalty_rules, BonusRule, PenaltyRule};
use crate::ConfigError;

/// Score normalizer and acceptance threshold of one scored strategy.
///
/// `confidence = min(score / normalizer, 1)`, accepted when strictly greater
/// than `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub normalizer: f64,
    pub threshold: f64,
}

impl StrategyParams {
    pub fn confidence(&self, score: f64) -> f64 {
        (score / self.normalizer).clamp(0.0, 1.0)
    }

    pub fn accepts(&self, confidence: f64) -> bool {
        confidence > self.threshold
    }
}

/// Every tunable of the resolution cascade.
///
/// `Default` carries the production weights. A JSON file may override any
/// subset of fields; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub domain_aware: StrategyParams,
    pub keyword: StrategyParams,
    pub fuzzy: StrategyParams,

    /// Added per domain term whose gloss occurs in the category, or whose raw
    /// token is a whole category word.
    pub domain_term_weight: f64,
    /// Multiplier on token length when a search token occurs in the category.
    pub keyword_substring_factor: f64,
    /// Search tokens shorter than this are ignored by KEYWORD.
    pub keyword_min_token_len: usize,
    pub fuzzy_partial_factor: f64,
    /// Tokens shorter than this are ignored by FUZZY.
    pub fuzzy_min_token_len: usize,

    pub bonus_rules: Vec<BonusRule>,
    pub penalty_rules: Vec<PenaltyRule>,
    pub synonyms: Vec<SynonymEntry>,
    pub pattern_override: PatternOverrideConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            domain_aware: StrategyParams {
                normalizer: 100.0,
                threshold: 0.3,
            },
            keyword: StrategyParams {
                normalizer: 50.0,
                threshold: 0.2,
            },
            fuzzy: StrategyParams {
                normalizer: 30.0,
                threshold: 0.15,
            },
            domain_term_weight: 50.0,
            keyword_substring_factor: 2.0,
            keyword_min_token_len: 2,
            fuzzy_partial_factor: 0.5,
            fuzzy_min_token_len: 3,
            bonus_rules: default_bonus_rules(),
            penalty_rules: default_penalty_rules(),
            synonyms: default_synonyms(),
            pattern_override: PatternOverrideConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Upper-case every string compared against category keys or title
    /// tokens. Trigger tags stay as written; they match extractor tags.
    pub fn normalize(&mut self) {
        fn keys(items: &mut [String]) {
            for item in items {
                *item = normalize_key(item);
            }
        }
        for rule in &mut self.bonus_rules {
            keys(&mut rule.category_all);
            keys(&mut rule.category_any);
        }
        for rule in &mut self.penalty_rules {
            keys(&mut rule.category_any);
            keys(&mut rule.unless_any);
        }
        for syn in &mut self.synonyms {
            keys(&mut syn.category_contains);
            keys(&mut syn.keywords);
        }
        let po = &mut self.pattern_override;
        po.department = normalize_key(&po.department);
        po.family = normalize_key(&po.family);
        po.generic_marker = normalize_key(&po.generic_marker);
        for (pattern, category) in &mut po.lexicon {
            *pattern = normalize_key(pattern);
            *category = normalize_key(category);
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            bonus_rules = config.bonus_rules.len(),
            penalty_rules = config.penalty_rules.len(),
            "loaded resolver config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, params) in [
            ("domain_aware", &self.domain_aware),
            ("keyword", &self.keyword),
            ("fuzzy", &self.fuzzy),
        ] {
            if params.normalizer.is_nan() || params.normalizer <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.normalizer must be positive, got {}",
                    params.normalizer
                )));
            }
            if !(0.0..=1.0).contains(&params.threshold) {
                return Err(ConfigError::Invalid(format!(
                    "{name}.threshold must be within [0, 1], got {}",
                    params.threshold
                )));
            }
        }
        for rule in &self.bonus_rules {
            if rule.when_tags.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bonus rule '{}' has no trigger tags",
                    rule.name
                )));
            }
        }
        for rule in &self.penalty_rules {
            if rule.when_tags.is_empty() || rule.category_any.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "penalty rule '{}' needs trigger tags and category substrings",
                    rule.name
                )));
            }
        }
        let po = &self.pattern_override;
        for c in [po.pattern_confidence, po.generic_confidence] {
            if !(0.0..=1.0).contains(&c) {
                return Err(ConfigError::Invalid(format!(
                    "pattern override confidence must be within [0, 1], got {c}"
                )));
            }
        }
        Ok(())
    }
}
