use std::sync::Arc;

use shelfmark_extract::ProductDescriptor;
use shelfmark_taxonomy::TaxonomyRecord;

use crate::template::{finish_title, MAX_TITLE_CHARS};
use crate::{CompletionBackend, SynthesisError, TitleSynthesizer};

const SYSTEM_PROMPT: &str = "You are an expert ecommerce title writer who creates titles that \
convert. You follow format rules exactly and optimize for search and sales.";

/// Title synthesis through a completion backend.
///
/// Failures are returned as errors; the caller decides on the fallback.
pub struct GenerativeSynthesizer {
    backend: Arc<dyn CompletionBackend>,
}

impl GenerativeSynthesizer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

/// `- Key: value` lines for every populated descriptor field.
pub fn format_product_data(descriptor: &ProductDescriptor) -> String {
    let fields: [(&str, Option<&str>); 9] = [
        ("Original title", Some(descriptor.raw_title())),
        ("Type", descriptor.product_type.as_deref()),
        ("Brand", descriptor.brand.as_deref()),
        ("Dimensions", descriptor.dimensions.as_deref()),
        ("Quantity", descriptor.quantity.as_deref()),
        ("Color", descriptor.color.as_deref()),
        ("R-value", descriptor.r_value.as_deref()),
        ("Model", descriptor.tile_pattern.as_deref()),
        ("Description", descriptor.description.as_deref()),
    ];
    let mut lines: Vec<String> = fields
        .into_iter()
        .filter_map(|(k, v)| v.filter(|v| !v.trim().is_empty()).map(|v| format!("- {k}: {v}")))
        .collect();
    for (k, v) in &descriptor.enrichment {
        lines.push(format!("- {k}: {v}"));
    }
    lines.join("\n")
}

pub fn render_title_prompt(descriptor: &ProductDescriptor, record: &TaxonomyRecord) -> String {
    let rule = record.naming_template();
    let example = record.example();
    format!(
        "CATEGORY: {category}\n\
         NAMING RULE: {rule}\n\
         EXAMPLE: {example}\n\
         \n\
         PRODUCT DATA:\n{data}\n\
         \n\
         INSTRUCTIONS:\n\
         1. Follow the naming rule format exactly: {rule}\n\
         2. Use the example as a template: {example}\n\
         3. Include brand, specifications, color and dimensions when available\n\
         4. Keep it under {max} characters\n\
         5. Put the most important keywords first\n\
         \n\
         Reply with ONE title and nothing else.",
        category = record.category(),
        data = format_product_data(descriptor),
        max = MAX_TITLE_CHARS,
    )
}

/// First non-empty line, quotes and list markers stripped, whitespace collapsed.
pub fn clean_model_title(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))
        .unwrap_or("");
    let line = line.trim_start_matches(|c: char| c == '-' || c == '*' || c.is_whitespace());
    let line = line.strip_prefix("Title:").unwrap_or(line);
    let unquoted: String = line.chars().filter(|c| !matches!(c, '"' | '\'' | '`')).collect();
    finish_title(&unquoted)
}

impl TitleSynthesizer for GenerativeSynthesizer {
    fn name(&self) -> &str {
        "generative"
    }

    fn synthesize(
        &self,
        descriptor: &ProductDescriptor,
        record: &TaxonomyRecord,
    ) -> Result<String, SynthesisError> {
        let prompt = render_title_prompt(descriptor, record);
        let raw = self.backend.complete(SYSTEM_PROMPT, &prompt)?;
        let title = clean_model_title(&raw);
        if title.is_empty() {
            return Err(SynthesisError::EmptyTitle(record.category().to_string()));
        }
        tracing::debug!(backend = self.backend.name(), title = %title, "generated title");
        Ok(title)
    }
}
