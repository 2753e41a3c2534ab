use rayon::prelude::*;
use std::sync::Arc;

use shelfmark_extract::{extract_descriptor, parse_structured_line, ProductDescriptor};
use shelfmark_label::{LabelFormatter, DEFAULT_LABEL_WIDTH};
use shelfmark_resolver::{CategoryResolver, MatchResult};
use shelfmark_synth::{
    CompletionBackend, Enricher, EnrichmentStatus, GenerativeSynthesizer, TemplateSynthesizer,
    TitleSynthesizer,
};

use crate::{ItemOutcome, ItemStatus, TitleSource};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub label_width: usize,
    /// Treat input lines as `title DEPARTMENT FAMILY CATEGORY` and recover hints.
    pub structured: bool,
    /// Run research enrichment before title synthesis (needs a backend).
    pub enrich: bool,
    /// Matches below this confidence are flagged for manual review.
    pub review_below: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            label_width: DEFAULT_LABEL_WIDTH,
            structured: false,
            enrich: false,
            review_below: 0.3,
        }
    }
}

/// Extract -> resolve -> (enrich) -> synthesize -> label, per item.
///
/// Shared across worker threads; nothing here is mutated after construction.
pub struct Pipeline {
    resolver: Arc<CategoryResolver>,
    generator: Option<GenerativeSynthesizer>,
    enricher: Option<Enricher>,
    template: TemplateSynthesizer,
    formatter: LabelFormatter,
    options: PipelineOptions,
}

impl Pipeline {
    /// Template-only pipeline with default options.
    pub fn new(resolver: Arc<CategoryResolver>) -> Self {
        Self::with_options(resolver, PipelineOptions::default())
    }

    pub fn with_options(resolver: Arc<CategoryResolver>, options: PipelineOptions) -> Self {
        Self {
            resolver,
            generator: None,
            enricher: None,
            template: TemplateSynthesizer,
            formatter: LabelFormatter::new(options.label_width),
            options,
        }
    }

    /// Use `backend` for titles, and for enrichment when `options.enrich` is set.
    pub fn with_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        if self.options.enrich {
            self.enricher = Some(Enricher::new(Arc::clone(&backend)));
        }
        self.generator = Some(GenerativeSynthesizer::new(backend));
        self
    }

    pub fn resolver(&self) -> &CategoryResolver {
        &self.resolver
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Descriptor for one input line, honoring structured mode.
    pub fn describe(&self, line: &str) -> ProductDescriptor {
        let mut d = if self.options.structured {
            parse_structured_line(line, self.resolver.store())
        } else {
            extract_descriptor(line)
        };
        self.resolver.tag_tile_pattern(&mut d);
        d
    }

    pub fn process_title(&self, raw_title: &str) -> ItemOutcome {
        self.process_item(1, raw_title)
    }

    /// Process a batch in parallel. Output order equals input order.
    pub fn process_batch<S: AsRef<str> + Sync>(&self, titles: &[S]) -> Vec<ItemOutcome> {
        tracing::info!(items = titles.len(), "processing batch");
        let outcomes: Vec<ItemOutcome> = titles
            .par_iter()
            .enumerate()
            .map(|(i, t)| self.process_item(i + 1, t.as_ref()))
            .collect();
        let matched = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(items = outcomes.len(), matched, "batch done");
        outcomes
    }

    fn process_item(&self, item: usize, raw_title: &str) -> ItemOutcome {
        let descriptor = self.describe(raw_title);
        let resolution = self.resolver.resolve(&descriptor);

        let mut outcome = ItemOutcome {
            item,
            raw_title: raw_title.to_string(),
            descriptor,
            resolution: None,
            title: None,
            title_source: None,
            label: None,
            label_step: None,
            enrichment: None,
            research_confidence: None,
            status: ItemStatus::NoMatch,
            errors: Vec::new(),
        };

        let Some(matched) = resolution else {
            tracing::debug!(item, title = raw_title, "no category match");
            outcome.errors.push("no category match".to_string());
            return outcome;
        };

        // Enrichment works on a copy; the resolver's input stays as extracted.
        let working = match &self.enricher {
            Some(enricher) => {
                let enrichment = enricher.research(&outcome.descriptor);
                if enrichment.status != EnrichmentStatus::Success {
                    if let Some(note) = &enrichment.note {
                        outcome.errors.push(format!("enrichment: {note}"));
                    }
                }
                outcome.enrichment = Some(enrichment.status);
                outcome.research_confidence = Some(enrichment.confidence);
                enrichment.descriptor
            }
            None => outcome.descriptor.clone(),
        };

        let (title, source) = self.synthesize(&working, &matched, &mut outcome.errors);
        let label = self.formatter.format_with_step(&title);

        outcome.status = if matched.confidence < self.options.review_below {
            ItemStatus::NeedsManualReview
        } else {
            ItemStatus::Success
        };
        outcome.title = Some(title);
        outcome.title_source = Some(source);
        outcome.label = Some(label.text);
        outcome.label_step = Some(label.step);
        outcome.descriptor = working;
        outcome.resolution = Some(matched);
        outcome
    }

    fn synthesize(
        &self,
        descriptor: &ProductDescriptor,
        matched: &MatchResult,
        errors: &mut Vec<String>,
    ) -> (String, TitleSource) {
        if let Some(generator) = &self.generator {
            match generator.synthesize(descriptor, &matched.record) {
                Ok(title) => return (title, TitleSource::Generative),
                Err(e) => {
                    tracing::warn!(
                        backend = generator.backend_name(),
                        error = %e,
                        "title generation failed, using naming template"
                    );
                    errors.push(format!("title generation: {e}"));
                }
            }
        }
        let source = if self.generator.is_some() {
            TitleSource::TemplateFallback
        } else {
            TitleSource::Template
        };
        let title = self
            .template
            .synthesize(descriptor, &matched.record)
            .unwrap_or_else(|_| shelfmark_synth::safe_fallback_title(descriptor, Some(&matched.record)));
        (title, source)
    }
}
