//! JSON listing client.
//!
//! Expects the endpoint to return a JSON array of objects with `title` and
//! `link` fields. Unknown fields are ignored.

use async_trait::async_trait;

use super::error::FeedError;
use super::traits::FeedClient;
use super::types::FeedItem;

pub struct JsonFeedClient {
    client: reqwest::Client,
    url: String,
}

impl JsonFeedClient {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    fn parse_listing(body: &str) -> Result<Vec<FeedItem>, FeedError> {
        serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))
    }
}

#[async_trait]
impl FeedClient for JsonFeedClient {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch_listing(&self) -> Result<Vec<FeedItem>, FeedError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Self::parse_listing(&body)
    }
}
