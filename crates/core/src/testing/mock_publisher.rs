//! Mock publisher for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::progress::TaskReporter;
use crate::publisher::{PublishError, Publisher};
use crate::task::{CancelScope, Task, TaskStage};

/// Mock implementation of the Publisher trait.
///
/// Records every delivered artifact and can be primed to fail the next call.
#[derive(Debug, Clone)]
pub struct MockPublisher {
    /// Published artifacts as (task id, artifact path) pairs, in order.
    published: Arc<RwLock<Vec<(String, PathBuf)>>>,
    /// If set, the next publish will fail with this error.
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all published artifacts as (task id, path) pairs, in order.
    pub async fn recorded_publishes(&self) -> Vec<(String, PathBuf)> {
        self.published.read().await.clone()
    }

    /// Get the number of publishes performed.
    pub async fn publish_count(&self) -> usize {
        self.published.read().await.len()
    }

    /// Configure the next publish to fail with the given error.
    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<PublishError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(
        &self,
        task: &Task,
        artifact: &Path,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<(), PublishError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if cancel.is_requested() {
            return Err(PublishError::Cancelled);
        }

        self.published
            .write()
            .await
            .push((task.id.clone(), artifact.to_path_buf()));

        progress.report(TaskStage::Publishing, 16, 16).await;
        Ok(())
    }
}
