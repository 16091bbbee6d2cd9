//! Trait definition for the fetch stage.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::progress::TaskReporter;
use crate::task::{CancelScope, Task};

use super::error::FetchError;

/// A fetcher that materializes a task's source as a local input file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Produces the local input path for `task.source`.
    ///
    /// Implementations poll `cancel` at every natural chunk boundary and
    /// must not leave a partial file behind when they return an error.
    async fn fetch(
        &self,
        task: &Task,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<PathBuf, FetchError>;
}
