//! The progress reporter and its per-task view.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

use crate::messenger::{MessageHandle, Messenger};
use crate::task::{Task, TaskStage};

use super::format::{eta_secs, format_bytes, format_duration, percent, progress_bar, speed};

/// Factory for per-task reporters, holding the shared transport and the
/// configured minimum interval between message edits.
pub struct ProgressReporter {
    messenger: Arc<dyn Messenger>,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(messenger: Arc<dyn Messenger>, interval: Duration) -> Self {
        Self {
            messenger,
            interval,
        }
    }

    /// Sends the initial status message for a task and returns the reporter
    /// that will keep editing it. A failed initial send degrades to a
    /// warning; later updates are then dropped silently.
    pub async fn begin(&self, task: &Task) -> TaskReporter {
        let text = format!("📂 {}\n⌑ Task: starting", task.display_name);
        let handle = match self.messenger.send(&text).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to send status message for {}: {}", task.id, e);
                None
            }
        };

        TaskReporter {
            messenger: Arc::clone(&self.messenger),
            handle,
            display_name: task.display_name.clone(),
            interval: self.interval,
            state: Mutex::new(ReporterState {
                stage: None,
                stage_started: Instant::now(),
                last_emit: None,
                high_water: 0,
                last_text: text,
            }),
        }
    }

    /// One-off operator notice (failure reports, queue listings).
    pub async fn announce(&self, text: &str) {
        if let Err(e) = self.messenger.send(text).await {
            warn!("Failed to send notice: {}", e);
        }
    }
}

struct ReporterState {
    stage: Option<TaskStage>,
    stage_started: Instant,
    last_emit: Option<Instant>,
    /// Highest `done` observed for the current stage; later reports are
    /// clamped so the display never moves backwards.
    high_water: u64,
    last_text: String,
}

/// Single-writer progress view for one task.
///
/// The active stage calls this cooperatively; there is no cross-thread
/// callback racing an event loop. Edits are throttled, monotonic and
/// idempotent (identical text is not re-sent).
pub struct TaskReporter {
    messenger: Arc<dyn Messenger>,
    handle: Option<MessageHandle>,
    display_name: String,
    interval: Duration,
    state: Mutex<ReporterState>,
}

impl TaskReporter {
    /// Marks a stage as entered. Always emits and resets the stage clock.
    pub async fn stage_started(&self, stage: TaskStage) {
        let text = {
            let mut state = self.state.lock().await;
            state.stage = Some(stage);
            state.stage_started = Instant::now();
            state.last_emit = None;
            state.high_water = 0;
            format!("📂 {}\n⌑ Task: {}…", self.display_name, stage.label())
        };
        self.emit(&text).await;
    }

    /// Reports stage progress. `done`/`total` are bytes for fetch and
    /// publish, elapsed/total media seconds for transcode; `total` of 0 means
    /// unknown. Throttled to one edit per interval.
    pub async fn report(&self, stage: TaskStage, done: u64, total: u64) {
        let text = {
            let mut state = self.state.lock().await;

            let done = done.max(state.high_water);
            state.high_water = done;

            let due = match state.last_emit {
                Some(at) => at.elapsed() >= self.interval,
                None => true,
            };
            if !due {
                return;
            }
            state.last_emit = Some(Instant::now());

            let elapsed = state.stage_started.elapsed().as_secs_f64();
            Self::render(&self.display_name, stage, done, total, elapsed)
        };
        self.emit(&text).await;
    }

    /// Marks a stage as complete. Always emits.
    pub async fn stage_completed(&self, stage: TaskStage) {
        let text = {
            let state = self.state.lock().await;
            let elapsed = state.stage_started.elapsed().as_secs();
            format!(
                "📂 {}\n⌑ {} complete in {}",
                self.display_name,
                stage.label(),
                format_duration(elapsed)
            )
        };
        self.emit(&text).await;
    }

    /// Final status edit for a terminal transition. Always emits.
    pub async fn finished(&self, text: &str) {
        let text = format!("📂 {}\n{}", self.display_name, text);
        self.emit(&text).await;
    }

    fn render(
        display_name: &str,
        stage: TaskStage,
        done: u64,
        total: u64,
        elapsed_secs: f64,
    ) -> String {
        let rate = speed(done, elapsed_secs);
        let eta = eta_secs(done, total, rate);
        let pct = percent(done, total);

        // Transcode progress is measured in media seconds, transfers in bytes.
        let (done_str, total_str, speed_str) = if stage == TaskStage::Transcoding {
            (
                format_duration(done),
                format_duration(total),
                format!("{:.2}x", rate),
            )
        } else {
            (
                format_bytes(done),
                format_bytes(total),
                format!("{}/s", format_bytes(rate as u64)),
            )
        };

        let mut text = format!("📂 {}\n⌑ Task: {}\n", display_name, stage.label());
        if total > 0 {
            text.push_str(&format!("⌑ {}\n", progress_bar(pct)));
            text.push_str(&format!("⌑ Done: {} / {}\n", done_str, total_str));
        } else {
            text.push_str(&format!("⌑ Done: {}\n", done_str));
        }
        text.push_str(&format!("⌑ Speed: {}\n", speed_str));
        match eta {
            Some(secs) => text.push_str(&format!("⌑ ETA: {}\n", format_duration(secs))),
            None => text.push_str("⌑ ETA: unknown\n"),
        }
        text.push_str(&format!(
            "⌑ Elapsed: {}",
            format_duration(elapsed_secs as u64)
        ));
        text
    }

    async fn emit(&self, text: &str) {
        let Some(ref handle) = self.handle else {
            return;
        };

        {
            let mut state = self.state.lock().await;
            if state.last_text == text {
                return;
            }
            state.last_text = text.to_string();
        }

        if let Err(e) = self.messenger.edit(handle, text).await {
            warn!("Failed to edit status message: {}", e);
        }
    }
}
