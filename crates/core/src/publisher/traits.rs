//! Trait definition for the publish stage.

use async_trait::async_trait;
use std::path::Path;

use crate::progress::TaskReporter;
use crate::task::{CancelScope, Task};

use super::error::PublishError;

/// A publisher that delivers a finished artifact to its destination.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the name of this publisher implementation.
    fn name(&self) -> &str;

    /// Delivers `artifact` for `task`, reporting upload progress the same
    /// way the fetch stage reports download progress.
    async fn publish(
        &self,
        task: &Task,
        artifact: &Path,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<(), PublishError>;
}
