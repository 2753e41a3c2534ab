use thiserror::Error;

/// Invalid or missing LLM backend configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{backend} backend requires {var} (set it in your env; do not hardcode secrets in scripts)")]
    MissingEnv { backend: &'static str, var: &'static str },

    #[error("invalid {var}={value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("unknown LLM backend '{0}' (expected openai, anthropic, ollama or mock)")]
    UnknownBackend(String),

    #[error("LLM backend '{0}' was not compiled in (enable the llm-{0} feature)")]
    BackendDisabled(String),
}

/// Failure to produce a title or research answer.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to reach {backend} at {url}: {message}")]
    Transport {
        backend: &'static str,
        url: String,
        message: String,
    },

    #[error("{backend} http error {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("{backend} returned no text")]
    EmptyResponse { backend: &'static str },

    #[error("{backend} returned an unexpected response: {message}")]
    InvalidResponse {
        backend: &'static str,
        message: String,
    },

    #[error("model did not return a JSON object: {0}")]
    NotJson(String),

    #[error("model returned an empty title for category '{0}'")]
    EmptyTitle(String),

    #[error("backend failure: {0}")]
    Backend(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
