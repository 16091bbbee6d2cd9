//! Configuration for the feed adapter.

use serde::{Deserialize, Serialize};

/// Configuration for the feed poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Listing endpoint returning a JSON array of `{title, link}` objects.
    pub url: String,

    /// Seconds between polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait before retrying after a fetch or parse error.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
}

fn default_poll_interval() -> u64 {
    600
}

fn default_error_backoff() -> u64 {
    120
}
