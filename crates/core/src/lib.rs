pub mod config;
pub mod feed;
pub mod fetcher;
pub mod ledger;
pub mod messenger;
pub mod orchestrator;
pub mod progress;
pub mod publisher;
pub mod task;
pub mod testing;
pub mod transcoder;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use feed::{FeedClient, FeedConfig, FeedError, FeedItem, FeedPoller, JsonFeedClient};
pub use fetcher::{sanitize_filename, FetchError, Fetcher, HttpFetcher};
pub use ledger::{Ledger, LedgerError};
pub use messenger::{MessageHandle, Messenger, MessengerError};
pub use orchestrator::{
    EnqueueError, Orchestrator, OrchestratorConfig, OrchestratorHandle, OrchestratorStatus,
};
pub use progress::{ProgressReporter, TaskReporter};
pub use publisher::{MessengerPublisher, PublishError, Publisher};
pub use task::{CancelScope, Task, TaskSource, TaskStage};
pub use transcoder::{
    FfmpegTranscoder, MediaInfo, TranscodeError, TranscodeJob, Transcoder, TranscoderConfig,
};
