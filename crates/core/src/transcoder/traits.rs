//! Trait definition for the transcode stage.

use async_trait::async_trait;
use std::path::Path;
use std::path::PathBuf;

use crate::progress::TaskReporter;
use crate::task::CancelScope;

use super::error::TranscodeError;
use super::types::{MediaInfo, TranscodeJob};

/// A transcoder that converts a fetched input into the target profile.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file for duration and stream information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError>;

    /// Runs the transcode and returns the output path.
    ///
    /// Implementations poll `cancel` between subprocess output lines and must
    /// terminate the external process on cancellation; neither an orphaned
    /// subprocess nor a partial output file may survive the call.
    async fn transcode(
        &self,
        job: TranscodeJob,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<PathBuf, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}
