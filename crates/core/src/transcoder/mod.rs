//! Transcode stage: invokes the external encoder on a fetched input file.
//!
//! The concrete implementation shells out to ffmpeg with a fixed target
//! profile, probes the input with ffprobe for the total media duration, and
//! parses the encoder's `time=` stderr markers for progress. Cancellation
//! kills the subprocess; a non-zero exit code is a hard failure.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{MediaInfo, TranscodeJob};
