//! Publisher that delivers artifacts through the chat transport.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::messenger::Messenger;
use crate::progress::TaskReporter;
use crate::task::{CancelScope, Task, TaskStage};

use super::error::PublishError;
use super::traits::Publisher;

/// Sends the finished artifact back to the chat as a document.
///
/// The byte-level upload lives inside the transport; progress is reported at
/// the stage boundaries with the artifact size as the total.
pub struct MessengerPublisher {
    messenger: Arc<dyn Messenger>,
}

impl MessengerPublisher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl Publisher for MessengerPublisher {
    fn name(&self) -> &str {
        "messenger"
    }

    async fn publish(
        &self,
        task: &Task,
        artifact: &Path,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<(), PublishError> {
        if cancel.is_requested() {
            return Err(PublishError::Cancelled);
        }

        let meta =
            tokio::fs::metadata(artifact)
                .await
                .map_err(|_| PublishError::ArtifactMissing {
                    path: artifact.to_path_buf(),
                })?;
        let total = meta.len();

        progress.report(TaskStage::Publishing, 0, total).await;

        self.messenger
            .send_document(artifact, &task.display_name)
            .await
            .map_err(|e| PublishError::Delivery(e.to_string()))?;

        progress.report(TaskStage::Publishing, total, total).await;
        Ok(())
    }
}
