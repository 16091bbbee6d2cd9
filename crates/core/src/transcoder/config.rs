//! Configuration for the transcode stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed target profile and process settings for the ffmpeg transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Video codec for the target profile.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Constant rate factor (0-51, lower is better quality).
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Resolution ceiling: outputs taller than this are scaled down,
    /// preserving aspect ratio. None disables scaling.
    #[serde(default = "default_max_height")]
    pub max_height: Option<u32>,

    /// Audio codec; "copy" passes the stream through untouched.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Hard limit on a single transcode in seconds. 0 disables the limit;
    /// operators cancel explicitly.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Additional global ffmpeg arguments.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_video_codec() -> String {
    "libx265".to_string()
}

fn default_crf() -> u8 {
    28
}

fn default_max_height() -> Option<u32> {
    Some(1080)
}

fn default_audio_codec() -> String {
    "copy".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            video_codec: default_video_codec(),
            crf: default_crf(),
            max_height: default_max_height(),
            audio_codec: default_audio_codec(),
            timeout_secs: 0,
            extra_ffmpeg_args: Vec::new(),
        }
    }
}
