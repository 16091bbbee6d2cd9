//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::progress::TaskReporter;
use crate::task::{CancelScope, TaskStage};
use crate::transcoder::{MediaInfo, TranscodeError, TranscodeJob, Transcoder};

/// A recorded transcode job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    /// The job that was submitted.
    pub job: TranscodeJob,
    /// Whether the transcode succeeded.
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Track transcode jobs for assertions
/// - Simulate success/failure
/// - Control probe results
/// - Simulate a slow encode that honors cancellation
/// - Write a real output file for cleanup assertions
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    /// Recorded transcodes.
    transcodes: Arc<RwLock<Vec<RecordedTranscode>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    /// Simulated encode duration in milliseconds.
    transcode_duration_ms: Arc<RwLock<u64>>,
    /// Whether to write a real file at the job's output path.
    write_output: Arc<RwLock<bool>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self {
            transcodes: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            transcode_duration_ms: Arc::new(RwLock::new(0)),
            write_output: Arc::new(RwLock::new(true)),
        }
    }

    /// Get all recorded transcodes.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.transcodes.read().await.clone()
    }

    /// Get the number of transcodes performed.
    pub async fn transcode_count(&self) -> usize {
        self.transcodes.read().await.len()
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated encode duration.
    pub async fn set_transcode_duration(&self, duration: Duration) {
        *self.transcode_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Enable or disable writing a real output file.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<TranscodeError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, job: &TranscodeJob, success: bool) {
        self.transcodes.write().await.push(RecordedTranscode {
            job: job.clone(),
            success,
        });
    }

    fn default_info(path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 100 * 1024 * 1024,
            duration_secs: 3600.0,
            format: "matroska".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1920),
            video_height: Some(1080),
            audio_codec: Some("aac".to_string()),
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }

        Ok(Self::default_info(path))
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<PathBuf, TranscodeError> {
        if let Some(err) = self.take_error().await {
            self.record(&job, false).await;
            return Err(err);
        }

        // Sleep in small steps so a cancellation request lands quickly.
        let mut remaining = *self.transcode_duration_ms.read().await;
        while remaining > 0 {
            if cancel.is_requested() {
                self.record(&job, false).await;
                return Err(TranscodeError::Cancelled);
            }
            let step = remaining.min(10);
            tokio::time::sleep(Duration::from_millis(step)).await;
            remaining -= step;
        }
        if cancel.is_requested() {
            self.record(&job, false).await;
            return Err(TranscodeError::Cancelled);
        }

        if *self.write_output.read().await {
            if let Some(parent) = job.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&job.output_path, b"mock output data").await?;
        }

        progress.report(TaskStage::Transcoding, 3600, 3600).await;

        let output = job.output_path.clone();
        self.record(&job, true).await;
        Ok(output)
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
