use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::feed::FeedConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub reporter: ReporterConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather
    pub token: String,
    /// Chat to send progress messages and finished files to
    pub chat_id: i64,
}

/// Working directories and ledger location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where fetched inputs land
    #[serde(default = "default_incoming_dir")]
    pub incoming_dir: PathBuf,
    /// Where encoded outputs land before publishing
    #[serde(default = "default_outgoing_dir")]
    pub outgoing_dir: PathBuf,
    /// Completed-task ledger file
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            incoming_dir: default_incoming_dir(),
            outgoing_dir: default_outgoing_dir(),
            ledger_path: default_ledger_path(),
        }
    }
}

fn default_incoming_dir() -> PathBuf {
    PathBuf::from("work/incoming")
}

fn default_outgoing_dir() -> PathBuf {
    PathBuf::from("work/outgoing")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("encodarr.ledger")
}

/// Progress reporting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReporterConfig {
    /// Minimum seconds between progress message edits
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval(),
        }
    }
}

fn default_update_interval() -> u64 {
    5
}
