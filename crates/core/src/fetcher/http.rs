//! HTTP streaming fetcher.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::progress::TaskReporter;
use crate::task::{CancelScope, Task, TaskSource, TaskStage};

use super::error::FetchError;
use super::traits::Fetcher;

/// Strips path separators out of a display name so a submitted title can
/// never escape the destination directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if cleaned.trim().is_empty() {
        "input.bin".to_string()
    } else {
        cleaned
    }
}

/// Streams remote sources into the incoming directory chunk by chunk;
/// local uploads are copied through.
pub struct HttpFetcher {
    client: reqwest::Client,
    incoming_dir: PathBuf,
}

impl HttpFetcher {
    pub fn new(incoming_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            incoming_dir: incoming_dir.into(),
        }
    }

    async fn fetch_remote(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<(), FetchError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        // Transfer-length hint; 0 means unknown and the display degrades to
        // an indeterminate form.
        let total = response.content_length().unwrap_or(0);
        debug!("Fetching {} ({} bytes expected)", url, total);

        let mut file = tokio::fs::File::create(dest).await?;
        let mut done: u64 = 0;

        loop {
            if cancel.is_requested() {
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(FetchError::Cancelled);
            }

            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(dest).await;
                    return Err(e.into());
                }
            };

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(e.into());
            }

            done += chunk.len() as u64;
            progress.report(TaskStage::Fetching, done, total).await;
        }

        file.flush().await?;
        progress.report(TaskStage::Fetching, done, done.max(total)).await;
        Ok(())
    }

    async fn fetch_upload(
        &self,
        source: &Path,
        dest: &Path,
        progress: &TaskReporter,
    ) -> Result<(), FetchError> {
        if !source.exists() {
            return Err(FetchError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        // An upload that was delivered straight into the incoming directory
        // is already in place; copying a file onto itself truncates it.
        let in_place = match (
            tokio::fs::canonicalize(source).await,
            tokio::fs::canonicalize(dest).await,
        ) {
            (Ok(s), Ok(d)) => s == d,
            _ => source == dest,
        };

        let size = if in_place {
            tokio::fs::metadata(source).await?.len()
        } else {
            tokio::fs::copy(source, dest).await?
        };
        progress.report(TaskStage::Fetching, size, size).await;
        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        task: &Task,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<PathBuf, FetchError> {
        if cancel.is_requested() {
            return Err(FetchError::Cancelled);
        }

        tokio::fs::create_dir_all(&self.incoming_dir).await?;
        let dest = self
            .incoming_dir
            .join(sanitize_filename(&task.display_name));

        match &task.source {
            TaskSource::Remote { url } => {
                self.fetch_remote(url, &dest, cancel, progress).await?
            }
            TaskSource::LocalUpload { path } => {
                self.fetch_upload(path, &dest, progress).await?
            }
        }

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressReporter;
    use crate::testing::MockMessenger;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Ep01.mkv"), "Ep01.mkv");
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename("  "), "input.bin");
    }

    async fn reporter_for(task: &Task) -> (Arc<MockMessenger>, TaskReporter) {
        let messenger = Arc::new(MockMessenger::new());
        let reporter = ProgressReporter::new(messenger.clone(), Duration::from_millis(0));
        let tr = reporter.begin(task).await;
        (messenger, tr)
    }

    #[tokio::test]
    async fn test_local_upload_pass_through_copy() {
        let source_dir = TempDir::new().unwrap();
        let incoming = TempDir::new().unwrap();

        let source = source_dir.path().join("clip.mkv");
        tokio::fs::write(&source, b"media bytes").await.unwrap();

        let task = Task::from_upload("clip.mkv", &source);
        let (_, progress) = reporter_for(&task).await;

        let fetcher = HttpFetcher::new(incoming.path());
        let out = fetcher
            .fetch(&task, &CancelScope::new(), &progress)
            .await
            .unwrap();

        assert_eq!(out, incoming.path().join("clip.mkv"));
        assert_eq!(tokio::fs::read(&out).await.unwrap(), b"media bytes");
        // Source is left in place; it belongs to the submitter.
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_upload_already_in_incoming_dir_is_left_intact() {
        let incoming = TempDir::new().unwrap();

        let source = incoming.path().join("clip.mkv");
        tokio::fs::write(&source, b"real media bytes").await.unwrap();

        let task = Task::from_upload("clip.mkv", &source);
        let (_, progress) = reporter_for(&task).await;

        let fetcher = HttpFetcher::new(incoming.path());
        let out = fetcher
            .fetch(&task, &CancelScope::new(), &progress)
            .await
            .unwrap();

        assert_eq!(out, source);
        assert_eq!(tokio::fs::read(&out).await.unwrap(), b"real media bytes");
    }

    #[tokio::test]
    async fn test_missing_upload_is_source_not_found() {
        let incoming = TempDir::new().unwrap();
        let task = Task::from_upload("gone.mkv", "/nonexistent/gone.mkv");
        let (_, progress) = reporter_for(&task).await;

        let fetcher = HttpFetcher::new(incoming.path());
        let err = fetcher
            .fetch(&task, &CancelScope::new(), &progress)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_pre_cancelled_fetch_short_circuits() {
        let incoming = TempDir::new().unwrap();
        let task = Task::from_feed("Ep01", "http://127.0.0.1:1/never");
        let (_, progress) = reporter_for(&task).await;

        let cancel = CancelScope::new();
        cancel.request();

        let fetcher = HttpFetcher::new(incoming.path());
        let err = fetcher.fetch(&task, &cancel, &progress).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
