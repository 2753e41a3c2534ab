//! Completion backends
//!
//! A backend takes a system prompt and a user prompt and returns raw model
//! text. Parsing and fallback live in the callers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{BackendKind, ConfigError, LlmConfig, SynthesisError};

pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    fn complete(&self, system: &str, user: &str) -> Result<String, SynthesisError>;
}

/// Replays canned responses in order, cycling when exhausted.
///
/// A backend built with [`MockBackend::failing`] returns
/// [`SynthesisError::Backend`] on every call.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Vec<String>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(response: impl Into<String>) -> Self {
        Self::new([response.into()])
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete(&self, _system: &str, _user: &str) -> Result<String, SynthesisError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.responses.is_empty() {
            return Err(SynthesisError::Backend("mock backend has no responses".into()));
        }
        Ok(self.responses[n % self.responses.len()].clone())
    }
}

/// Build the backend named by `config`.
///
/// A backend whose cargo feature is off yields
/// [`ConfigError::BackendDisabled`].
pub fn create_backend(config: &LlmConfig) -> Result<Arc<dyn CompletionBackend>, ConfigError> {
    match config.backend {
        // offline: every call fails, so callers exercise their fallbacks
        BackendKind::Mock => Ok(Arc::new(MockBackend::failing())),

        #[cfg(feature = "llm-openai")]
        BackendKind::OpenAi => Ok(Arc::new(crate::http::OpenAiBackend::new(config.clone())?)),
        #[cfg(not(feature = "llm-openai"))]
        BackendKind::OpenAi => Err(ConfigError::BackendDisabled("openai".into())),

        #[cfg(feature = "llm-anthropic")]
        BackendKind::Anthropic => Ok(Arc::new(crate::http::AnthropicBackend::new(
            config.clone(),
        )?)),
        #[cfg(not(feature = "llm-anthropic"))]
        BackendKind::Anthropic => Err(ConfigError::BackendDisabled("anthropic".into())),

        #[cfg(feature = "llm-ollama")]
        BackendKind::Ollama => Ok(Arc::new(crate::http::OllamaBackend::new(config.clone())?)),
        #[cfg(not(feature = "llm-ollama"))]
        BackendKind::Ollama => Err(ConfigError::BackendDisabled("ollama".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_cycles_responses() {
        let mock = MockBackend::new(["a", "b"]);
        assert_eq!(mock.complete("", "").unwrap(), "a");
        assert_eq!(mock.complete("", "").unwrap(), "b");
        assert_eq!(mock.complete("", "").unwrap(), "a");
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(matches!(
            mock.complete("s", "u"),
            Err(SynthesisError::Backend(_))
        ));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_create_mock_backend() {
        let config = LlmConfig {
            backend: BackendKind::Mock,
            model: "mock".into(),
            base_url: String::new(),
            api_key: None,
            timeout: None,
        };
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "mock");
        assert!(backend.complete("", "").is_err());
    }
}
