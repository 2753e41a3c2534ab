//! "Web research" enrichment
//!
//! Asks a completion backend what the product is and folds the answer into a
//! new descriptor. The model is expected to reply with
//! `{verified_product_type, product_category, is_construction_hardware, confidence}`;
//! anything less structured is salvaged with a regex at low confidence.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use shelfmark_extract::ProductDescriptor;

use crate::json::parse_llm_json_object;
use crate::CompletionBackend;

const RESEARCH_SYSTEM_PROMPT: &str = "You are a product expert. Always respond with valid JSON only.";

/// Confidence recorded when the answer had to be salvaged from free text.
pub const SALVAGE_CONFIDENCE: f64 = 0.3;
/// Confidence recorded when the backend could not be reached.
pub const FAILURE_CONFIDENCE: f64 = 0.1;
const DEFAULT_ANSWER_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Structured answer parsed.
    Success,
    /// Free-text answer; product type salvaged.
    Fallback,
    /// Backend error; descriptor left as it was.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResearchAnswer {
    pub verified_product_type: String,
    #[serde(default)]
    pub product_category: Option<String>,
    #[serde(default)]
    pub is_construction_hardware: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub descriptor: ProductDescriptor,
    pub status: EnrichmentStatus,
    pub confidence: f64,
    /// Backend error or parse problem, when there was one.
    pub note: Option<String>,
}

pub struct Enricher {
    backend: Arc<dyn CompletionBackend>,
}

/// Query text: title, brand and product type, space-joined.
pub fn research_query(descriptor: &ProductDescriptor) -> String {
    let title = descriptor
        .description
        .as_deref()
        .unwrap_or(descriptor.raw_title());
    [
        Some(title),
        descriptor.brand.as_deref(),
        descriptor.product_type.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.trim().is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn render_research_prompt(query: &str) -> String {
    format!(
        "Analyze this construction/hardware product: {query}\n\
         \n\
         Return ONLY this JSON (no other text):\n\
         {{\n  \"verified_product_type\": \"specific product type\",\n  \
         \"product_category\": \"department category\",\n  \
         \"is_construction_hardware\": true,\n  \
         \"confidence\": 0.8\n}}"
    )
}

fn salvage_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r#""verified_product_type"\s*:\s*"([^"]+)""#,
            r#"(?i)product.type.*?:\s*"?([^",\n]+)"#,
            r"(?i)type.*?:\s*([A-Za-z\s]+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Best-effort product type from an answer that is not valid JSON.
pub fn salvage_product_type(text: &str) -> Option<String> {
    salvage_patterns().iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

impl Enricher {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Never fails: backend and parse problems are reported in the status.
    pub fn research(&self, descriptor: &ProductDescriptor) -> Enrichment {
        let query = research_query(descriptor);
        let text = match self
            .backend
            .complete(RESEARCH_SYSTEM_PROMPT, &render_research_prompt(&query))
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "research request failed");
                return Enrichment {
                    descriptor: descriptor.enriched([("research_error", "api_failed")], [""; 0]),
                    status: EnrichmentStatus::Failed,
                    confidence: FAILURE_CONFIDENCE,
                    note: Some(e.to_string()),
                };
            }
        };

        match parse_llm_json_object::<ResearchAnswer>(&text) {
            Ok(answer) if !answer.verified_product_type.trim().is_empty() => {
                let confidence = answer
                    .confidence
                    .filter(|c| c.is_finite())
                    .unwrap_or(DEFAULT_ANSWER_CONFIDENCE)
                    .clamp(0.0, 1.0);
                let mut fields = vec![
                    ("product_type", answer.verified_product_type.clone()),
                    ("verified_product_type", answer.verified_product_type.clone()),
                    ("research_confidence", format!("{confidence:.2}")),
                ];
                if let Some(cat) = &answer.product_category {
                    fields.push(("product_category", cat.clone()));
                }
                if let Some(hw) = answer.is_construction_hardware {
                    fields.push(("is_construction_hardware", hw.to_string()));
                }
                let keywords: Vec<&str> = answer
                    .verified_product_type
                    .split_whitespace()
                    .filter(|w| w.chars().count() > 2)
                    .collect();
                tracing::debug!(product_type = %answer.verified_product_type, "research answer parsed");
                Enrichment {
                    descriptor: descriptor.enriched(fields, keywords),
                    status: EnrichmentStatus::Success,
                    confidence,
                    note: None,
                }
            }
            parsed => {
                let note = match parsed {
                    Err(e) => e.to_string(),
                    Ok(_) => "empty verified_product_type".to_string(),
                };
                let fallback_type = salvage_product_type(&text)
                    .unwrap_or_else(|| descriptor.raw_title().trim().to_string());
                tracing::warn!(note = %note, fallback_type = %fallback_type, "research answer not usable, salvaging");
                Enrichment {
                    descriptor: descriptor.enriched(
                        [
                            ("verified_product_type", fallback_type),
                            ("research_confidence", format!("{SALVAGE_CONFIDENCE:.2}")),
                        ],
                        [""; 0],
                    ),
                    status: EnrichmentStatus::Fallback,
                    confidence: SALVAGE_CONFIDENCE,
                    note: Some(note),
                }
            }
        }
    }
}
