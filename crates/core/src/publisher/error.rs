//! Error types for the publish stage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while publishing an artifact.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The artifact to publish does not exist.
    #[error("artifact not found: {path}")]
    ArtifactMissing { path: PathBuf },

    /// The transport failed to deliver the artifact.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Local I/O failed while reading the artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cancellation observed before or during delivery.
    #[error("publish cancelled")]
    Cancelled,
}

impl PublishError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
