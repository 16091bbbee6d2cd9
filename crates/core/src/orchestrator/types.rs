//! Types for the pipeline orchestrator.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

use crate::task::{CancelScope, Task, TaskStage};

/// Why an enqueue was rejected.
///
/// A duplicate is a no-op signal, not a failure: the same feed item may be
/// re-discovered while the first task is still queued or active.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("duplicate task: {0}")]
    Duplicate(String),
}

/// A failure or cancellation surfaced by one stage runner.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StageFailure {
    /// The stage that was running when the failure occurred.
    pub stage: TaskStage,
    pub message: String,
    pub cancelled: bool,
}

impl StageFailure {
    pub fn new(stage: TaskStage, cancelled: bool, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Live view of the active task, for the status surface.
#[derive(Debug, Clone)]
pub struct ActiveTask {
    pub id: String,
    pub display_name: String,
    pub stage: TaskStage,
}

/// Record of a task that reached a terminal stage.
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub id: String,
    pub display_name: String,
    pub stage: TaskStage,
    pub finished_at: DateTime<Utc>,
}

/// Point-in-time snapshot of the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub queue_len: usize,
    pub active: Option<ActiveTask>,
}

/// The currently active task's control-plane record.
pub(super) struct ActiveEntry {
    pub id: String,
    pub display_name: String,
    pub stage: TaskStage,
    pub cancel: CancelScope,
}

/// Mutable orchestrator state, shared between the run loop and handles.
pub(super) struct State {
    pub queue: VecDeque<Task>,
    pub active: Option<ActiveEntry>,
    pub history: VecDeque<CompletedTask>,
    pub history_limit: usize,
}

impl State {
    pub fn record_terminal(&mut self, task: &Task) {
        self.history.push_back(CompletedTask {
            id: task.id.clone(),
            display_name: task.display_name.clone(),
            stage: task.stage,
            finished_at: Utc::now(),
        });
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }
}

/// State plus the wakeup used when new work arrives.
pub(super) struct Shared {
    pub state: Mutex<State>,
    pub notify: Notify,
}

impl Shared {
    pub fn new(history_limit: usize) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                active: None,
                history: VecDeque::new(),
                history_limit,
            }),
            notify: Notify::new(),
        }
    }
}
