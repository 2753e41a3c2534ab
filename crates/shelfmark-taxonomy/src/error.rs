use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a taxonomy. Fatal at startup: no partial taxonomy is served.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("taxonomy source not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read taxonomy source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed taxonomy data: {0}")]
    Csv(#[from] csv::Error),

    #[error("taxonomy source is missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("taxonomy row {row} has an empty {column} field")]
    EmptyField { row: usize, column: &'static str },
}
