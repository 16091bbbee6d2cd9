//! Non-generic control plane for the orchestrator.

use std::sync::Arc;

use tracing::debug;

use crate::ledger::Ledger;
use crate::task::{Task, TaskStage};

use super::types::{ActiveTask, CompletedTask, EnqueueError, OrchestratorStatus, Shared};

/// Cloneable handle used by source adapters and the command surface.
///
/// Every operation here is safe to call concurrently with the run loop; all
/// state lives behind one lock and cancellation is a flag on the active
/// task's own scope.
#[derive(Clone)]
pub struct OrchestratorHandle {
    pub(super) shared: Arc<Shared>,
    pub(super) ledger: Arc<Ledger>,
}

impl OrchestratorHandle {
    /// Appends a pending task to the queue.
    ///
    /// Idempotent per task id: an id that is already queued, active, or
    /// committed to the ledger is rejected with [`EnqueueError::Duplicate`].
    /// This guards against a feed re-discovering an item before its ledger
    /// commit lands.
    pub async fn enqueue(&self, task: Task) -> Result<(), EnqueueError> {
        if self.ledger.contains(&task.id).await {
            return Err(EnqueueError::Duplicate(task.id));
        }

        let mut state = self.shared.state.lock().await;

        let already_queued = state.queue.iter().any(|t| t.id == task.id);
        let currently_active = state
            .active
            .as_ref()
            .is_some_and(|active| active.id == task.id);
        if already_queued || currently_active {
            return Err(EnqueueError::Duplicate(task.id));
        }

        debug!("Enqueued task {} ({})", task.id, task.display_name);
        state.queue.push_back(task);
        drop(state);

        self.shared.notify.notify_one();
        Ok(())
    }

    /// Requests cancellation of the active task. Returns whether a task was
    /// active; the queue is untouched either way.
    pub async fn cancel_active(&self) -> bool {
        let state = self.shared.state.lock().await;
        match &state.active {
            Some(active) => {
                active.cancel.request();
                true
            }
            None => false,
        }
    }

    /// Abandons the active task only, leaving the queue intact.
    ///
    /// Same per-task cancel flag as [`cancel_active`](Self::cancel_active);
    /// the two exist as distinct operations so the command surface can pair
    /// "cancel" with a queue clear without sharing flags across tasks.
    pub async fn skip_active(&self) -> bool {
        self.cancel_active().await
    }

    /// Drops all pending tasks without touching the active one. Returns the
    /// number of tasks dropped.
    pub async fn clear_queue(&self) -> usize {
        let mut state = self.shared.state.lock().await;
        let dropped = state.queue.len();
        state.queue.clear();
        dropped
    }

    /// Current queue length and active task, if any.
    pub async fn status(&self) -> OrchestratorStatus {
        let state = self.shared.state.lock().await;
        OrchestratorStatus {
            queue_len: state.queue.len(),
            active: state.active.as_ref().map(|active| ActiveTask {
                id: active.id.clone(),
                display_name: active.display_name.clone(),
                stage: active.stage,
            }),
        }
    }

    /// Pending tasks in queue order.
    pub async fn queue_snapshot(&self) -> Vec<Task> {
        let state = self.shared.state.lock().await;
        state.queue.iter().cloned().collect()
    }

    /// Terminal task records, oldest first.
    pub async fn history(&self) -> Vec<CompletedTask> {
        let state = self.shared.state.lock().await;
        state.history.iter().cloned().collect()
    }

    /// Whether the orchestrator is idle: empty queue and no active task.
    pub async fn is_idle(&self) -> bool {
        let state = self.shared.state.lock().await;
        state.queue.is_empty() && state.active.is_none()
    }

    /// Terminal stage recorded for `id`, if it has finished.
    pub async fn terminal_stage(&self, id: &str) -> Option<TaskStage> {
        let state = self.shared.state.lock().await;
        state
            .history
            .iter()
            .rev()
            .find(|record| record.id == id)
            .map(|record| record.stage)
    }
}
