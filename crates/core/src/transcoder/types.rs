//! Types for the transcode stage.

use std::path::PathBuf;

/// Media information from a probe.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Total media duration; 0.0 when the container does not report one.
    pub duration_secs: f64,
    pub format: String,
    pub video_codec: Option<String>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub audio_codec: Option<String>,
}

/// A transcode request for one input file.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub task_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}
