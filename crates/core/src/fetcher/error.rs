//! Error types for the fetch stage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching a task's source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network transfer failed (connect, timeout, bad status, partial read).
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A manually submitted local file does not exist.
    #[error("source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Local I/O failed while writing the fetched bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cancellation observed mid-transfer. Operator-initiated, not a failure.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transfer(e.to_string())
    }
}
