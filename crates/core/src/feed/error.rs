//! Error types for the feed adapter.

use thiserror::Error;

/// Errors from fetching or parsing the release listing.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The listing endpoint could not be fetched.
    #[error("feed fetch failed: {0}")]
    Http(String),

    /// The response body was not a valid listing.
    #[error("feed parse failed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
