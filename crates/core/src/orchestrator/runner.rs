//! Orchestrator run loop.
//!
//! Pulls one pending task at a time and drives it through the stage
//! sequence. No stage error ever terminates the loop: a bad task is
//! reported once and the next one runs.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::fetcher::Fetcher;
use crate::ledger::Ledger;
use crate::progress::{ProgressReporter, TaskReporter};
use crate::publisher::Publisher;
use crate::task::{CancelScope, Task, TaskStage};
use crate::transcoder::{TranscodeJob, Transcoder};

use super::config::OrchestratorConfig;
use super::handle::OrchestratorHandle;
use super::types::{ActiveEntry, Shared, StageFailure};

/// The pipeline orchestrator, generic over its stage runners.
pub struct Orchestrator<F, T, P>
where
    F: Fetcher + 'static,
    T: Transcoder + 'static,
    P: Publisher + 'static,
{
    config: OrchestratorConfig,
    shared: Arc<Shared>,
    ledger: Arc<Ledger>,
    fetcher: Arc<F>,
    transcoder: Arc<T>,
    publisher: Arc<P>,
    reporter: Arc<ProgressReporter>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<F, T, P> Orchestrator<F, T, P>
where
    F: Fetcher + 'static,
    T: Transcoder + 'static,
    P: Publisher + 'static,
{
    /// Creates a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        ledger: Arc<Ledger>,
        fetcher: F,
        transcoder: T,
        publisher: P,
        reporter: Arc<ProgressReporter>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let shared = Arc::new(Shared::new(config.history_limit));

        Self {
            config,
            shared,
            ledger,
            fetcher: Arc::new(fetcher),
            transcoder: Arc::new(transcoder),
            publisher: Arc::new(publisher),
            reporter,
            shutdown_tx,
        }
    }

    /// Control-plane handle for source adapters and the command surface.
    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            shared: Arc::clone(&self.shared),
            ledger: Arc::clone(&self.ledger),
        }
    }

    /// Signals the run loop to stop after the current task.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// The main loop. Suspends while idle and wakes when a task is enqueued;
    /// exits only on [`stop`](Self::stop).
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!("Orchestrator run loop started");

        loop {
            let (task, cancel) = tokio::select! {
                _ = shutdown_rx.recv() => break,
                dequeued = self.next_task() => dequeued,
            };
            self.execute(task, cancel).await;
        }

        info!("Orchestrator run loop stopped");
    }

    /// Waits for the next pending task and promotes it to active with a
    /// fresh cancellation scope.
    async fn next_task(&self) -> (Task, CancelScope) {
        loop {
            {
                let mut state = self.shared.state.lock().await;
                if let Some(task) = state.queue.pop_front() {
                    let cancel = CancelScope::new();
                    state.active = Some(ActiveEntry {
                        id: task.id.clone(),
                        display_name: task.display_name.clone(),
                        stage: task.stage,
                        cancel: cancel.clone(),
                    });
                    return (task, cancel);
                }
            }
            self.shared.notify.notified().await;
        }
    }

    /// Runs one task to a terminal state: stages, ledger commit, artifact
    /// cleanup, history record.
    async fn execute(&self, mut task: Task, cancel: CancelScope) {
        info!("Processing task {} ({})", task.id, task.display_name);
        let progress = self.reporter.begin(&task).await;

        let outcome = self.run_stages(&mut task, &cancel, &progress).await;

        task.stage = match outcome {
            Ok(()) => {
                // The only place an identifier enters the ledger: after
                // publish succeeded. Persistence errors are non-fatal.
                if let Err(e) = self.ledger.commit(&task.id).await {
                    warn!("Ledger commit failed for {}: {}", task.id, e);
                }
                progress.finished("✅ Process complete").await;
                info!("Task {} done", task.id);
                TaskStage::Done
            }
            Err(failure) if failure.is_cancelled() => {
                progress.finished("🚫 Cancelled").await;
                info!("Task {} cancelled during {}", task.id, failure.stage.label());
                TaskStage::Cancelled
            }
            Err(failure) => {
                warn!(
                    "Task {} failed during {}: {}",
                    task.id,
                    failure.stage.label(),
                    failure
                );
                progress
                    .finished(&format!(
                        "❌ {} failed: {}",
                        failure.stage.label(),
                        failure
                    ))
                    .await;
                TaskStage::Failed
            }
        };

        self.cleanup(&task).await;

        let mut state = self.shared.state.lock().await;
        state.record_terminal(&task);
        state.active = None;
    }

    async fn run_stages(
        &self,
        task: &mut Task,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<(), StageFailure> {
        // Fetch
        self.enter_stage(task, TaskStage::Fetching, progress).await;
        let input = self
            .fetcher
            .fetch(task, cancel, progress)
            .await
            .map_err(|e| StageFailure::new(TaskStage::Fetching, e.is_cancelled(), e.to_string()))?;
        task.local_input_path = Some(input.clone());
        progress.stage_completed(TaskStage::Fetching).await;

        // Transcode
        self.enter_stage(task, TaskStage::Transcoding, progress).await;
        let output_path = self.config.outgoing_dir.join(Self::output_name(&input));
        let job = TranscodeJob {
            task_id: task.id.clone(),
            input_path: input,
            output_path,
        };
        let output = self
            .transcoder
            .transcode(job, cancel, progress)
            .await
            .map_err(|e| {
                StageFailure::new(TaskStage::Transcoding, e.is_cancelled(), e.to_string())
            })?;
        task.local_output_path = Some(output.clone());
        progress.stage_completed(TaskStage::Transcoding).await;

        // Publish
        self.enter_stage(task, TaskStage::Publishing, progress).await;
        self.publisher
            .publish(task, &output, cancel, progress)
            .await
            .map_err(|e| {
                StageFailure::new(TaskStage::Publishing, e.is_cancelled(), e.to_string())
            })?;
        progress.stage_completed(TaskStage::Publishing).await;

        Ok(())
    }

    /// Records the stage on the task and the active entry, and announces it.
    async fn enter_stage(&self, task: &mut Task, stage: TaskStage, progress: &TaskReporter) {
        task.stage = stage;
        {
            let mut state = self.shared.state.lock().await;
            if let Some(active) = state.active.as_mut() {
                active.stage = stage;
            }
        }
        progress.stage_started(stage).await;
    }

    fn output_name(input: &Path) -> String {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "output.mkv".to_string());
        format!("encoded_{}", name)
    }

    /// Removes local artifacts unconditionally; runs on every terminal
    /// transition.
    async fn cleanup(&self, task: &Task) {
        for path in [&task.local_input_path, &task.local_output_path]
            .into_iter()
            .flatten()
        {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove artifact {:?}: {}", path, e),
            }
        }
    }
}
