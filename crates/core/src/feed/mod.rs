//! Release feed source adapter.
//!
//! An independent periodic task that polls an external listing, skips items
//! already committed to the ledger, and enqueues the rest. Feed errors never
//! crash the poller; it retries after a backoff.

mod config;
mod error;
mod json;
mod poller;
mod traits;
mod types;

pub use config::FeedConfig;
pub use error::FeedError;
pub use json::JsonFeedClient;
pub use poller::FeedPoller;
pub use traits::FeedClient;
pub use types::FeedItem;
