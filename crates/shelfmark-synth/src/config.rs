//! LLM backend configuration
//!
//! Everything comes from the environment:
//! - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`
//! - `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL`, `ANTHROPIC_BASE_URL`, `ANTHROPIC_VERSION`
//! - `OLLAMA_HOST`, `OLLAMA_MODEL`
//! - `SHELFMARK_LLM_TIMEOUT_SECS` (`0` disables the timeout)

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::ConfigError;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const ANTHROPIC_MODEL_ENV: &str = "ANTHROPIC_MODEL";
pub const ANTHROPIC_VERSION_ENV: &str = "ANTHROPIC_VERSION";
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";
pub const SHELFMARK_LLM_TIMEOUT_SECS_ENV: &str = "SHELFMARK_LLM_TIMEOUT_SECS";

pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    Anthropic,
    Ollama,
    /// Offline dry runs: every request fails and callers fall back.
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Anthropic => "anthropic",
            BackendKind::Ollama => "ollama",
            BackendKind::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(BackendKind::OpenAi),
            "anthropic" | "claude" => Ok(BackendKind::Anthropic),
            "ollama" | "local" => Ok(BackendKind::Ollama),
            "mock" => Ok(BackendKind::Mock),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Resolved settings for one backend.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LlmConfig {
    pub backend: BackendKind,
    pub model: String,
    pub base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

// Keep keys out of debug logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_trimmed(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize a base URL: default when blank, scheme added when missing, no
/// trailing slash.
pub fn normalize_base_url(base_url: &str, default: &str, default_scheme: &str) -> String {
    let mut host = base_url.trim().to_string();
    if host.is_empty() {
        host = default.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("{default_scheme}://{host}");
    }
    host.trim_end_matches('/').to_string()
}

/// Effective request timeout: `SHELFMARK_LLM_TIMEOUT_SECS`, else the default.
pub fn llm_timeout() -> Result<Option<Duration>, ConfigError> {
    let secs = match env_trimmed(SHELFMARK_LLM_TIMEOUT_SECS_ENV) {
        Some(v) => v.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            var: SHELFMARK_LLM_TIMEOUT_SECS_ENV,
            value: v.clone(),
            reason: "expected integer seconds; 0 disables",
        })?,
        None => DEFAULT_LLM_TIMEOUT_SECS,
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

impl LlmConfig {
    /// Settings for `backend` from the environment.
    pub fn from_env(backend: BackendKind) -> Result<Self, ConfigError> {
        let timeout = llm_timeout()?;
        let config = match backend {
            BackendKind::OpenAi => Self {
                backend,
                model: env_trimmed(OPENAI_MODEL_ENV).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
                base_url: normalize_base_url(
                    &env_trimmed(OPENAI_BASE_URL_ENV).unwrap_or_default(),
                    DEFAULT_OPENAI_BASE_URL,
                    "https",
                ),
                api_key: Some(env_trimmed(OPENAI_API_KEY_ENV).ok_or(ConfigError::MissingEnv {
                    backend: "OpenAI",
                    var: OPENAI_API_KEY_ENV,
                })?),
                timeout,
            },
            BackendKind::Anthropic => Self {
                backend,
                model: env_trimmed(ANTHROPIC_MODEL_ENV)
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.into()),
                base_url: normalize_base_url(
                    &env_trimmed(ANTHROPIC_BASE_URL_ENV).unwrap_or_default(),
                    DEFAULT_ANTHROPIC_BASE_URL,
                    "https",
                ),
                api_key: Some(env_trimmed(ANTHROPIC_API_KEY_ENV).ok_or(
                    ConfigError::MissingEnv {
                        backend: "Anthropic",
                        var: ANTHROPIC_API_KEY_ENV,
                    },
                )?),
                timeout,
            },
            BackendKind::Ollama => Self {
                backend,
                model: env_trimmed(OLLAMA_MODEL_ENV).unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
                // Ollama is plain http on loopback by default.
                base_url: normalize_base_url(
                    &env_trimmed(OLLAMA_HOST_ENV).unwrap_or_default(),
                    DEFAULT_OLLAMA_HOST,
                    "http",
                ),
                api_key: None,
                timeout,
            },
            BackendKind::Mock => Self {
                backend,
                model: "mock".into(),
                base_url: String::new(),
                api_key: None,
                timeout,
            },
        };
        Ok(config)
    }

    /// First backend with credentials in the environment: OpenAI, then
    /// Anthropic. Ollama needs no key, so it is only used when asked for.
    pub fn detect() -> Option<BackendKind> {
        if env_trimmed(OPENAI_API_KEY_ENV).is_some() {
            Some(BackendKind::OpenAi)
        } else if env_trimmed(ANTHROPIC_API_KEY_ENV).is_some() {
            Some(BackendKind::Anthropic)
        } else {
            None
        }
    }

    pub fn anthropic_version() -> String {
        env_trimmed(ANTHROPIC_VERSION_ENV).unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.into())
    }

    pub fn status_line(&self) -> String {
        let timeout = match self.timeout {
            Some(t) => format!("{}s", t.as_secs()),
            None => "none".to_string(),
        };
        format!(
            "{} model={} url={} timeout={}",
            self.backend, self.model, self.base_url, timeout
        )
    }
}
