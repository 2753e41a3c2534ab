//! The resolution cascade
//!
//! EXACT → PATTERN_OVERRIDE → DOMAIN_AWARE → KEYWORD → FUZZY. The first
//! strategy whose confidence clears its threshold wins. Within a scored
//! strategy the highest score wins and exact ties go to the earliest record
//! in taxonomy order.

use std::collections::BTreeSet;
use std::sync::Arc;

use shelfmark_extract::{upper_tokens, vocabulary::is_connector, ProductDescriptor};
use shelfmark_taxonomy::{TaxonomyRecord, TaxonomyStore};

use crate::pattern::{apply_override, tile_pattern_name};
use crate::rules::evaluate_rules;
use crate::{
    KeywordIndex, MatchResult, ResolutionTrace, ResolverConfig, Strategy, StrategyAttempt,
    StrategyParams,
};

fn char_len(s: &str) -> f64 {
    s.chars().count() as f64
}

/// Resolves descriptors against a shared, read-only taxonomy.
///
/// Holds no mutable state: `resolve` is a pure function of the descriptor,
/// the taxonomy and the config, and may be called from any number of threads.
#[derive(Debug, Clone)]
pub struct CategoryResolver {
    store: Arc<TaxonomyStore>,
    config: ResolverConfig,
    keywords: KeywordIndex,
}

/// Best record of a scored strategy.
struct Scored {
    index: usize,
    score: f64,
}

impl CategoryResolver {
    pub fn new(store: Arc<TaxonomyStore>) -> Self {
        Self::with_config(store, ResolverConfig::default())
    }

    pub fn with_config(store: Arc<TaxonomyStore>, mut config: ResolverConfig) -> Self {
        config.normalize();
        let keywords = KeywordIndex::build(&store, &config.synonyms);
        Self {
            store,
            config,
            keywords,
        }
    }

    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Re-derive `tile_pattern` from this resolver's pattern lexicon, which
    /// may differ from the extractor's built-in table.
    pub fn tag_tile_pattern(&self, descriptor: &mut ProductDescriptor) {
        descriptor.tile_pattern =
            tile_pattern_name(descriptor.raw_title(), &self.config.pattern_override);
    }

    /// Best match for `descriptor`, or `None` when no strategy clears its
    /// threshold.
    pub fn resolve(&self, descriptor: &ProductDescriptor) -> Option<MatchResult> {
        self.run(descriptor, None)
    }

    /// Same computation as [`resolve`](Self::resolve), recording every attempt.
    pub fn explain(&self, descriptor: &ProductDescriptor) -> ResolutionTrace {
        let mut attempts = Vec::new();
        let result = self.run(descriptor, Some(&mut attempts));
        ResolutionTrace { attempts, result }
    }

    fn run(
        &self,
        descriptor: &ProductDescriptor,
        mut trace: Option<&mut Vec<StrategyAttempt>>,
    ) -> Option<MatchResult> {
        for strategy in Strategy::CASCADE {
            let (attempt, record) = self.attempt(strategy, descriptor);

            tracing::debug!(
                title = descriptor.raw_title(),
                strategy = %strategy,
                skipped = ?attempt.skipped,
                score = attempt.raw_score,
                confidence = attempt.confidence,
                accepted = attempt.accepted,
                best = ?attempt.best,
                "strategy attempt"
            );

            let result = match (attempt.accepted, record) {
                (true, Some(record)) => Some(MatchResult {
                    record: record.clone(),
                    confidence: attempt.confidence,
                    strategy,
                    raw_score: attempt.raw_score,
                    detail: attempt.detail.clone(),
                }),
                _ => None,
            };
            if let Some(t) = trace.as_deref_mut() {
                t.push(attempt);
            }
            if result.is_some() {
                return result;
            }
        }
        tracing::debug!(title = descriptor.raw_title(), "no strategy matched");
        None
    }

    fn attempt(
        &self,
        strategy: Strategy,
        descriptor: &ProductDescriptor,
    ) -> (StrategyAttempt, Option<&TaxonomyRecord>) {
        match strategy {
            Strategy::Exact => self.try_exact(descriptor),
            Strategy::PatternOverride => self.try_pattern(descriptor),
            Strategy::DomainAware => {
                if descriptor.detected_domain_terms.is_empty() {
                    return (
                        StrategyAttempt::skipped(strategy, "no domain terms"),
                        None,
                    );
                }
                let best = self.best_by(|r| self.domain_score(descriptor, r));
                let detail = best.as_ref().and_then(|b| {
                    let record = &self.store.all_records()[b.index];
                    let fired = evaluate_rules(
                        &self.config.bonus_rules,
                        &self.config.penalty_rules,
                        descriptor,
                        record.category_key(),
                    )
                    .fired;
                    (!fired.is_empty()).then(|| format!("rules: {}", fired.join(", ")))
                });
                self.scored(strategy, self.config.domain_aware, best, detail)
            }
            Strategy::Keyword => {
                let tokens = self.keyword_tokens(descriptor);
                if tokens.is_empty() {
                    return (
                        StrategyAttempt::skipped(strategy, "no search tokens"),
                        None,
                    );
                }
                let best = self.best_by(|r| self.keyword_score(&tokens, r));
                self.scored(strategy, self.config.keyword, best, None)
            }
            Strategy::Fuzzy => {
                let tokens = self.fuzzy_tokens(descriptor);
                if tokens.is_empty() {
                    return (
                        StrategyAttempt::skipped(strategy, "no search tokens"),
                        None,
                    );
                }
                let best = self.best_by(|r| self.fuzzy_score(&tokens, r));
                self.scored(strategy, self.config.fuzzy, best, None)
            }
        }
    }

    // ------------------------------------------------------------------------
    // EXACT / PATTERN_OVERRIDE
    // ------------------------------------------------------------------------

    fn try_exact(&self, d: &ProductDescriptor) -> (StrategyAttempt, Option<&TaxonomyRecord>) {
        let (Some(dept), Some(family), Some(category)) = (
            d.department_hint.as_deref(),
            d.family_hint.as_deref(),
            d.category_hint.as_deref(),
        ) else {
            return (
                StrategyAttempt::skipped(Strategy::Exact, "hints incomplete"),
                None,
            );
        };

        let record = self.store.find_exact(dept, family, category);
        let found = record.is_some();
        let attempt = StrategyAttempt {
            strategy: Strategy::Exact,
            skipped: None,
            best: record.map(TaxonomyRecord::path),
            raw_score: if found { 1.0 } else { 0.0 },
            confidence: if found { 1.0 } else { 0.0 },
            threshold: None,
            accepted: found,
            detail: None,
        };
        (attempt, record)
    }

    fn try_pattern(&self, d: &ProductDescriptor) -> (StrategyAttempt, Option<&TaxonomyRecord>) {
        match apply_override(d.raw_title(), &self.store, &self.config.pattern_override) {
            Some(hit) => {
                let attempt = StrategyAttempt {
                    strategy: Strategy::PatternOverride,
                    skipped: None,
                    best: Some(hit.record.path()),
                    raw_score: hit.confidence,
                    confidence: hit.confidence,
                    threshold: None,
                    accepted: true,
                    detail: Some(hit.trigger.describe()),
                };
                (attempt, Some(hit.record))
            }
            None => (
                StrategyAttempt::skipped(Strategy::PatternOverride, "no pattern trigger or target"),
                None,
            ),
        }
    }

    // ------------------------------------------------------------------------
    // Scored strategies
    // ------------------------------------------------------------------------

    fn best_by<F>(&self, mut score: F) -> Option<Scored>
    where
        F: FnMut(&TaxonomyRecord) -> f64,
    {
        let mut best: Option<Scored> = None;
        for (index, record) in self.store.all_records().iter().enumerate() {
            let s = score(record);
            if s > best.as_ref().map_or(0.0, |b| b.score) {
                best = Some(Scored { index, score: s });
            }
        }
        best
    }

    fn scored(
        &self,
        strategy: Strategy,
        params: StrategyParams,
        best: Option<Scored>,
        detail: Option<String>,
    ) -> (StrategyAttempt, Option<&TaxonomyRecord>) {
        let record = best.as_ref().map(|b| &self.store.all_records()[b.index]);
        let raw_score = best.as_ref().map_or(0.0, |b| b.score);
        let confidence = params.confidence(raw_score);
        let attempt = StrategyAttempt {
            strategy,
            skipped: None,
            best: record.map(TaxonomyRecord::path),
            raw_score,
            confidence,
            threshold: Some(params.threshold),
            accepted: record.is_some() && params.accepts(confidence),
            detail,
        };
        (attempt, record)
    }

    fn domain_score(&self, d: &ProductDescriptor, record: &TaxonomyRecord) -> f64 {
        let category = record.category_key();
        let words = upper_tokens(category);
        // Glosses may match inside a word (TORNILLO in TORNILLOS). Raw tokens are
        // abbreviations (TOR) and only count as a whole category word.
        let overlaps = d
            .detected_domain_terms
            .iter()
            .filter(|t| category.contains(t.gloss.as_str()) || words.contains(&t.token))
            .count() as f64;
        let rules = evaluate_rules(
            &self.config.bonus_rules,
            &self.config.penalty_rules,
            d,
            category,
        );
        overlaps * self.config.domain_term_weight + rules.adjustment
    }

    fn keyword_tokens(&self, d: &ProductDescriptor) -> Vec<String> {
        let fields = [
            d.description.as_deref(),
            Some(d.raw_title()),
            d.product_type.as_deref(),
            d.department_hint.as_deref(),
            d.family_hint.as_deref(),
            d.category_hint.as_deref(),
        ];
        fields
            .into_iter()
            .flatten()
            .flat_map(upper_tokens)
            .chain(d.detected_keywords.iter().flat_map(|k| upper_tokens(k)))
            .filter(|t| t.chars().count() >= self.config.keyword_min_token_len && !is_connector(t))
            .collect()
    }

    fn keyword_score(&self, tokens: &[String], record: &TaxonomyRecord) -> f64 {
        let category = record.category_key();
        let empty = BTreeSet::new();
        let keywords = self.keywords.keywords(record.position()).unwrap_or(&empty);
        let mut score = 0.0;
        for token in tokens {
            if category.contains(token.as_str()) {
                score += self.config.keyword_substring_factor * char_len(token);
            }
            for kw in keywords {
                if kw.contains(token.as_str()) || token.contains(kw.as_str()) {
                    score += char_len(kw);
                }
            }
        }
        score
    }

    fn fuzzy_tokens(&self, d: &ProductDescriptor) -> Vec<String> {
        let raw = d.raw_title();
        let mut text = raw.to_string();
        if let Some(desc) = d.description.as_deref() {
            if !desc.trim().eq_ignore_ascii_case(raw.trim()) {
                text.push(' ');
                text.push_str(desc);
            }
        }
        upper_tokens(&text)
            .into_iter()
            .filter(|t| t.chars().count() >= self.config.fuzzy_min_token_len && !is_connector(t))
            .collect()
    }

    fn fuzzy_score(&self, tokens: &[String], record: &TaxonomyRecord) -> f64 {
        let category = record.category_key();
        let words: Vec<String> = upper_tokens(category)
            .into_iter()
            .filter(|w| w.chars().count() >= self.config.fuzzy_min_token_len)
            .collect();
        let mut score = 0.0;
        for token in tokens {
            if category.contains(token.as_str()) {
                score += char_len(token);
            } else if words
                .iter()
                .any(|w| w.contains(token.as_str()) || token.contains(w.as_str()))
            {
                score += self.config.fuzzy_partial_factor * char_len(token);
            }
        }
        score
    }
}
