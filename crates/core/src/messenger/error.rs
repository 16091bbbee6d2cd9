//! Error types for the messenger boundary.

use thiserror::Error;

/// Errors surfaced by a chat transport.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// The transport could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote API rejected the request.
    #[error("api error: {0}")]
    Api(String),

    /// Local I/O failed while preparing a payload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
