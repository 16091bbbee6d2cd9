//! The task record flowing through the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Where a task's media comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TaskSource {
    /// A file reachable over HTTP.
    Remote { url: String },
    /// A file already present on local disk (manual submission).
    LocalUpload { path: PathBuf },
}

/// Pipeline stage a task is in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    Pending,
    Fetching,
    Transcoding,
    Publishing,
    Done,
    Failed,
    Cancelled,
}

impl TaskStage {
    /// Whether the task has finished, one way or another.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Human-readable label for status messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Fetching => "Downloading",
            Self::Transcoding => "Encoding",
            Self::Publishing => "Uploading",
            Self::Done => "Done",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// One unit of work moving through fetch, transcode and publish.
///
/// A task is either queued (always `Pending`), active (mutated only by the
/// orchestrator run loop) or terminal. Local paths are created by the fetch
/// and transcode stages and removed unconditionally on terminal transition.
#[derive(Debug, Clone)]
pub struct Task {
    /// Stable identifier: the feed link for feed items, a generated UUID for
    /// manual submissions.
    pub id: String,
    /// Human-readable label for chat messages.
    pub display_name: String,
    pub source: TaskSource,
    pub stage: TaskStage,
    pub local_input_path: Option<PathBuf>,
    pub local_output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task for a feed item, keyed by the feed's unique link.
    ///
    /// The link is the most stable upstream identifier available; title-based
    /// keys break on renames and re-releases.
    pub fn from_feed(title: impl Into<String>, link: impl Into<String>) -> Self {
        let link = link.into();
        Self {
            id: link.clone(),
            display_name: title.into(),
            source: TaskSource::Remote { url: link },
            stage: TaskStage::Pending,
            local_input_path: None,
            local_output_path: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a task for a manually submitted remote file.
    pub fn from_url(display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            source: TaskSource::Remote { url: url.into() },
            stage: TaskStage::Pending,
            local_input_path: None,
            local_output_path: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a task for a file already on local disk.
    pub fn from_upload(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            source: TaskSource::LocalUpload { path: path.into() },
            stage: TaskStage::Pending,
            local_input_path: None,
            local_output_path: None,
            created_at: Utc::now(),
        }
    }
}

/// Cancellation scope owned by the active task record.
///
/// One scope per active task; a fresh scope is created each time a task
/// becomes active, so a cancel request can never bleed into the next task.
/// Stage runners poll it at natural checkpoints: a chunk write, a subprocess
/// output line. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    flag: Arc<AtomicBool>,
}

impl CancelScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
