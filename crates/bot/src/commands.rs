//! Chat command surface.
//!
//! Long-polls Telegram for messages in the configured chat and translates
//! them into orchestrator operations. A media attachment is a submission; a
//! slash command is a control operation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use encodarr_core::{EnqueueError, OrchestratorHandle, ProgressReporter, Task};

use crate::telegram::{IncomingMessage, TelegramClient};

const POLL_TIMEOUT_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// A recognized chat command.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Submit a remote file by URL.
    Encode(String),
    /// Abort the active task and drop the backlog.
    Cancel,
    /// Abort the active task, keep the backlog.
    Skip,
    /// Show the active task and pending queue.
    Queue,
}

fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    // Commands in groups arrive as "/cmd@botname".
    let head = head.split('@').next().unwrap_or(head);

    match head {
        "/encode" => parts.next().map(|url| Command::Encode(url.to_string())),
        "/cancel" => Some(Command::Cancel),
        "/skip" => Some(Command::Skip),
        "/queue" => Some(Command::Queue),
        _ => None,
    }
}

/// Display name for a URL submission: the last path segment, or the URL
/// itself when there is none.
fn url_display_name(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains("://"))
        .unwrap_or(url)
        .to_string()
}

/// The long-poll command loop.
pub struct CommandLoop {
    client: Arc<TelegramClient>,
    handle: OrchestratorHandle,
    reporter: Arc<ProgressReporter>,
    incoming_dir: PathBuf,
}

impl CommandLoop {
    pub fn new(
        client: Arc<TelegramClient>,
        handle: OrchestratorHandle,
        reporter: Arc<ProgressReporter>,
        incoming_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            handle,
            reporter,
            incoming_dir,
        }
    }

    /// Runs until a shutdown signal is received.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Command loop started");
        let mut offset = 0i64;

        loop {
            let updates = tokio::select! {
                _ = shutdown_rx.recv() => break,
                result = self.client.get_updates(offset, POLL_TIMEOUT_SECS) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.handle_message(message).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("Update poll failed, backing off: {}", e);
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Command loop stopped");
    }

    async fn handle_message(&self, message: IncomingMessage) {
        if message.chat.id != self.client.chat_id() {
            return;
        }

        // An attachment is a submission regardless of any caption text.
        if let Some(attachment) = message.document.or(message.video) {
            let name = attachment
                .file_name
                .clone()
                .unwrap_or_else(|| format!("upload_{}.mkv", message.message_id));
            self.submit_upload(&attachment.file_id, &name).await;
            return;
        }

        let Some(command) = message.text.as_deref().and_then(parse_command) else {
            return;
        };

        match command {
            Command::Encode(url) => self.submit_url(&url).await,
            Command::Cancel => self.cancel().await,
            Command::Skip => self.skip().await,
            Command::Queue => self.show_queue().await,
        }
    }

    async fn submit_upload(&self, file_id: &str, name: &str) {
        info!("Received upload submission: {}", name);
        let path = match self
            .client
            .download_file(file_id, &self.incoming_dir, name)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to download upload {}: {}", name, e);
                self.reporter
                    .announce(&format!("❌ Could not receive {}: {}", name, e))
                    .await;
                return;
            }
        };

        self.enqueue(Task::from_upload(name, path)).await;
    }

    async fn submit_url(&self, url: &str) {
        info!("Received URL submission: {}", url);
        self.enqueue(Task::from_url(url_display_name(url), url)).await;
    }

    async fn enqueue(&self, task: Task) {
        let display_name = task.display_name.clone();
        match self.handle.enqueue(task).await {
            Ok(()) => {
                let queued = self.handle.status().await.queue_len;
                self.reporter
                    .announce(&format!("📥 Queued {} (position {})", display_name, queued))
                    .await;
            }
            Err(EnqueueError::Duplicate(id)) => {
                self.reporter
                    .announce(&format!("♻️ {} is already known, skipping", id))
                    .await;
            }
        }
    }

    async fn cancel(&self) {
        // Drop the backlog first so the run loop cannot promote a task
        // between the two calls.
        let dropped = self.handle.clear_queue().await;
        let cancelled = self.handle.cancel_active().await;

        let text = match (cancelled, dropped) {
            (false, 0) => "Nothing to cancel".to_string(),
            (true, 0) => "🚫 Cancelling active task".to_string(),
            (false, n) => format!("🚫 Dropped {} queued task(s)", n),
            (true, n) => format!("🚫 Cancelling active task, dropped {} queued task(s)", n),
        };
        self.reporter.announce(&text).await;
    }

    async fn skip(&self) {
        let text = if self.handle.skip_active().await {
            "⏭ Skipping active task"
        } else {
            "Nothing to skip"
        };
        self.reporter.announce(text).await;
    }

    async fn show_queue(&self) {
        let status = self.handle.status().await;
        let queue = self.handle.queue_snapshot().await;

        let mut text = String::new();
        match status.active {
            Some(active) => {
                text.push_str(&format!(
                    "⚙️ Active: {} ({})\n",
                    active.display_name,
                    active.stage.label()
                ));
            }
            None => text.push_str("⚙️ Active: none\n"),
        }

        if queue.is_empty() {
            text.push_str("📋 Queue is empty");
        } else {
            text.push_str(&format!("📋 Queued ({}):", queue.len()));
            for (index, task) in queue.iter().enumerate() {
                text.push_str(&format!("\n{}. {}", index + 1, task.display_name));
            }
        }

        self.reporter.announce(&text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("/encode http://x/file.mkv"),
            Some(Command::Encode("http://x/file.mkv".to_string()))
        );
        assert_eq!(parse_command("/cancel"), Some(Command::Cancel));
        assert_eq!(parse_command("/skip"), Some(Command::Skip));
        assert_eq!(parse_command("/queue"), Some(Command::Queue));
    }

    #[test]
    fn test_parse_command_with_bot_suffix() {
        assert_eq!(parse_command("/queue@encodarr_bot"), Some(Command::Queue));
        assert_eq!(
            parse_command("/encode@encodarr_bot http://x/a.mkv"),
            Some(Command::Encode("http://x/a.mkv".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("/encode"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/unknown"), None);
    }

    #[test]
    fn test_url_display_name() {
        assert_eq!(url_display_name("http://x/media/Ep01.mkv"), "Ep01.mkv");
        assert_eq!(url_display_name("http://x/media/Ep01.mkv/"), "Ep01.mkv");
        assert_eq!(url_display_name("http://host"), "host");
    }
}
