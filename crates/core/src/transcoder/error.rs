//! Error types for the transcode stage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transcoding.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("ffmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("ffprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The encoder exited with a non-zero status.
    #[error("ffmpeg exited with code {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    /// Failed to probe the input media.
    #[error("failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Transcode exceeded the configured time limit.
    #[error("transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while driving the subprocess.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cancellation observed mid-encode. Operator-initiated, not a failure.
    #[error("transcode cancelled")]
    Cancelled,
}

impl TranscodeError {
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
