//! Types for the feed adapter.

use serde::{Deserialize, Serialize};

/// One entry of a release listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// The feed's unique link; used as the task identifier.
    pub link: String,
}
