//! Blocking HTTP backends (OpenAI Responses, Anthropic Messages, Ollama chat).
//!
//! One request per call, no retries. The timeout comes from [`LlmConfig`].

use serde_json::json;
use std::time::Duration;

use crate::{CompletionBackend, ConfigError, LlmConfig, SynthesisError};

const MAX_OUTPUT_TOKENS: u32 = 512;

fn client(
    backend: &'static str,
    timeout: Option<Duration>,
) -> Result<reqwest::blocking::Client, SynthesisError> {
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| SynthesisError::InvalidResponse {
        backend,
        message: format!("failed to build http client: {e}"),
    })
}

fn check_status(
    backend: &'static str,
    resp: reqwest::blocking::Response,
) -> Result<serde_json::Value, SynthesisError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();
        return Err(SynthesisError::Status {
            backend,
            status,
            body,
        });
    }
    resp.json().map_err(|e| SynthesisError::InvalidResponse {
        backend,
        message: format!("invalid JSON: {e}"),
    })
}

fn require_key(config: &LlmConfig, backend: &'static str, var: &'static str) -> Result<String, ConfigError> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingEnv { backend, var })
}

// =============================================================================
// OpenAI backend (Responses API)
// =============================================================================

#[cfg(feature = "llm-openai")]
pub struct OpenAiBackend {
    config: LlmConfig,
    api_key: String,
}

#[cfg(feature = "llm-openai")]
impl OpenAiBackend {
    pub fn new(config: LlmConfig) -> Result<Self, ConfigError> {
        let api_key = require_key(&config, "OpenAI", crate::config::OPENAI_API_KEY_ENV)?;
        Ok(Self { config, api_key })
    }
}

/// Concatenated `output_text` parts of every `message` item.
#[cfg(feature = "llm-openai")]
pub(crate) fn openai_extract_output_text(v: &serde_json::Value) -> Option<String> {
    let mut out = String::new();
    for item in v.get("output")?.as_array()? {
        if item.get("type").and_then(|x| x.as_str()) != Some("message") {
            continue;
        }
        let Some(content) = item.get("content").and_then(|x| x.as_array()) else {
            continue;
        };
        for c in content {
            if c.get("type").and_then(|x| x.as_str()) != Some("output_text") {
                continue;
            }
            if let Some(t) = c.get("text").and_then(|x| x.as_str()) {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(t);
            }
        }
    }
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(feature = "llm-openai")]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, SynthesisError> {
        const BACKEND: &str = "openai";
        let url = format!("{}/v1/responses", self.config.base_url);
        let mut body = json!({
            "model": self.config.model,
            "input": user,
            "max_output_tokens": MAX_OUTPUT_TOKENS,
        });
        if !system.is_empty() {
            body["instructions"] = json!(system);
        }

        let resp = client(BACKEND, self.config.timeout)?
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| SynthesisError::Transport {
                backend: BACKEND,
                url: url.clone(),
                message: e.to_string(),
            })?;
        let v = check_status(BACKEND, resp)?;
        openai_extract_output_text(&v).ok_or(SynthesisError::EmptyResponse { backend: BACKEND })
    }
}

// =============================================================================
// Anthropic backend (Messages API)
// =============================================================================

#[cfg(feature = "llm-anthropic")]
pub struct AnthropicBackend {
    config: LlmConfig,
    api_key: String,
    version: String,
}

#[cfg(feature = "llm-anthropic")]
impl AnthropicBackend {
    pub fn new(config: LlmConfig) -> Result<Self, ConfigError> {
        let api_key = require_key(&config, "Anthropic", crate::config::ANTHROPIC_API_KEY_ENV)?;
        Ok(Self {
            config,
            api_key,
            version: LlmConfig::anthropic_version(),
        })
    }
}

#[cfg(feature = "llm-anthropic")]
pub(crate) fn anthropic_extract_output_text(v: &serde_json::Value) -> Option<String> {
    let mut out = String::new();
    for b in v.get("content")?.as_array()? {
        if b.get("type").and_then(|x| x.as_str()) != Some("text") {
            continue;
        }
        if let Some(t) = b.get("text").and_then(|x| x.as_str()) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(t);
        }
    }
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(feature = "llm-anthropic")]
impl CompletionBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, SynthesisError> {
        const BACKEND: &str = "anthropic";
        let url = format!("{}/v1/messages", self.config.base_url);
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "temperature": 0,
            "messages": [ { "role": "user", "content": user } ],
        });
        if !system.is_empty() {
            body["system"] = json!(system);
        }

        let resp = client(BACKEND, self.config.timeout)?
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.version)
            .json(&body)
            .send()
            .map_err(|e| SynthesisError::Transport {
                backend: BACKEND,
                url: url.clone(),
                message: e.to_string(),
            })?;
        let v = check_status(BACKEND, resp)?;
        anthropic_extract_output_text(&v).ok_or(SynthesisError::EmptyResponse { backend: BACKEND })
    }
}

// =============================================================================
// Ollama backend (local /api/chat)
// =============================================================================

#[cfg(feature = "llm-ollama")]
pub struct OllamaBackend {
    config: LlmConfig,
}

#[cfg(feature = "llm-ollama")]
impl OllamaBackend {
    pub fn new(config: LlmConfig) -> Result<Self, ConfigError> {
        Ok(Self { config })
    }
}

#[cfg(feature = "llm-ollama")]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, SynthesisError> {
        const BACKEND: &str = "ollama";
        let url = format!("{}/api/chat", self.config.base_url);
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": user }));
        let body = json!({
            "model": self.config.model,
            "stream": false,
            "messages": messages,
            "options": { "temperature": 0 },
        });

        let resp = client(BACKEND, self.config.timeout)?
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| SynthesisError::Transport {
                backend: BACKEND,
                url: url.clone(),
                message: format!("{e} (is `ollama serve` running? set OLLAMA_HOST)"),
            })?;
        let v = check_status(BACKEND, resp)?;
        v.pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .ok_or(SynthesisError::EmptyResponse { backend: BACKEND })
    }
}
