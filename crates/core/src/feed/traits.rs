//! Trait definition for the feed boundary.

use async_trait::async_trait;

use super::error::FeedError;
use super::types::FeedItem;

/// A client that can fetch the current release listing.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Returns the name of this feed client implementation.
    fn name(&self) -> &str;

    /// Fetches the current listing, newest entries included.
    async fn fetch_listing(&self) -> Result<Vec<FeedItem>, FeedError>;
}
