//! Language-model backend selection for the CLI.

use anyhow::{Context, Result};
use std::sync::Arc;

use shelfmark_synth::{create_backend, BackendKind, CompletionBackend, LlmConfig};

/// What `--llm` asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LlmChoice {
    Off,
    /// First backend with credentials in the environment.
    Auto,
    Backend(BackendKind),
}

pub(crate) fn parse_llm_choice(value: &str) -> Result<LlmChoice> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "none" => Ok(LlmChoice::Off),
        "auto" => Ok(LlmChoice::Auto),
        other => Ok(LlmChoice::Backend(other.parse::<BackendKind>()?)),
    }
}

/// Build the requested backend, or `None` when generation is off.
pub(crate) fn select_backend(choice: LlmChoice) -> Result<Option<Arc<dyn CompletionBackend>>> {
    let kind = match choice {
        LlmChoice::Off => return Ok(None),
        LlmChoice::Auto => match LlmConfig::detect() {
            Some(kind) => kind,
            None => {
                tracing::warn!("no LLM credentials found; titles come from naming templates");
                return Ok(None);
            }
        },
        LlmChoice::Backend(kind) => kind,
    };
    let config = LlmConfig::from_env(kind)
        .with_context(|| format!("failed to configure the {kind} backend"))?;
    tracing::info!(backend = %config.backend, model = %config.model, "using LLM backend");
    let backend = create_backend(&config)?;
    Ok(Some(backend))
}

/// Names of the backends compiled into this binary.
pub(crate) fn compiled_backends() -> Vec<&'static str> {
    let mut out = Vec::new();
    if cfg!(feature = "llm-openai") {
        out.push("openai");
    }
    if cfg!(feature = "llm-anthropic") {
        out.push("anthropic");
    }
    if cfg!(feature = "llm-ollama") {
        out.push("ollama");
    }
    out
}

/// One status line per backend, `Err` carrying the configuration problem.
pub(crate) fn backend_statuses() -> Vec<(BackendKind, Result<String, String>)> {
    [BackendKind::OpenAi, BackendKind::Anthropic, BackendKind::Ollama]
        .into_iter()
        .map(|kind| {
            let status = LlmConfig::from_env(kind)
                .map(|c| c.status_line())
                .map_err(|e| e.to_string());
            (kind, status)
        })
        .collect()
}
