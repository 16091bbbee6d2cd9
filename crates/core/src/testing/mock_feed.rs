//! Mock feed client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::feed::{FeedClient, FeedError, FeedItem};

/// Mock implementation of the FeedClient trait.
///
/// Serves a configurable listing and counts polls; can be primed to fail the
/// next fetch.
#[derive(Debug, Clone)]
pub struct MockFeedClient {
    items: Arc<RwLock<Vec<FeedItem>>>,
    next_error: Arc<RwLock<Option<FeedError>>>,
    poll_count: Arc<RwLock<usize>>,
}

impl Default for MockFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeedClient {
    /// Create a new mock feed client with an empty listing.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            poll_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Replace the served listing.
    pub async fn set_items(&self, items: Vec<FeedItem>) {
        *self.items.write().await = items;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FeedError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get the number of fetches performed.
    pub async fn poll_count(&self) -> usize {
        *self.poll_count.read().await
    }
}

#[async_trait]
impl FeedClient for MockFeedClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_listing(&self) -> Result<Vec<FeedItem>, FeedError> {
        *self.poll_count.write().await += 1;

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.items.read().await.clone())
    }
}
