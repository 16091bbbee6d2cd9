//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of all external boundary traits,
//! allowing full pipeline tests without a chat surface, an HTTP source, or an
//! ffmpeg binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use encodarr_core::testing::{MockFetcher, MockTranscoder, MockPublisher};
//!
//! let fetcher = MockFetcher::new();
//! let transcoder = MockTranscoder::new();
//! let publisher = MockPublisher::new();
//!
//! // Configure mock behavior
//! transcoder.set_next_error(TranscodeError::probe_failed("no stream")).await;
//!
//! // Use in an Orchestrator...
//! ```

mod mock_feed;
mod mock_fetcher;
mod mock_messenger;
mod mock_publisher;
mod mock_transcoder;

pub use mock_feed::MockFeedClient;
pub use mock_fetcher::MockFetcher;
pub use mock_messenger::MockMessenger;
pub use mock_publisher::MockPublisher;
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};
