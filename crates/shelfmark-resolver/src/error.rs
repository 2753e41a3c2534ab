use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or validate a [`crate::ResolverConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read resolver config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid resolver config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid resolver config: {0}")]
    Invalid(String),
}
