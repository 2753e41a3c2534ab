//! Title synthesis for Shelfmark
//!
//! Turns a descriptor plus its resolved taxonomy record into an ecommerce
//! title:
//! - deterministic naming-template join ([`TemplateSynthesizer`])
//! - generative titles through a completion backend ([`GenerativeSynthesizer`])
//! - "web research" enrichment of descriptors ([`Enricher`])
//!
//! HTTP backends (OpenAI, Anthropic, Ollama) are behind the `llm-*` cargo
//! features and are configured from the environment ([`LlmConfig::from_env`]).

pub mod backend;
pub mod config;
pub mod enrich;
pub mod error;
pub mod generative;
#[cfg(any(feature = "llm-openai", feature = "llm-anthropic", feature = "llm-ollama"))]
pub mod http;
pub mod json;
pub mod template;

pub use backend::*;
pub use config::{BackendKind, LlmConfig};
pub use enrich::{Enricher, Enrichment, EnrichmentStatus};
pub use error::*;
pub use generative::GenerativeSynthesizer;
pub use json::parse_llm_json_object;
pub use template::{safe_fallback_title, TemplateSynthesizer, TitleSynthesizer};
