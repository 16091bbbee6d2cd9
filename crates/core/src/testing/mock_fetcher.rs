//! Mock fetcher for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, Fetcher};
use crate::progress::TaskReporter;
use crate::task::{CancelScope, Task, TaskStage};

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Track fetched task ids for assertions
/// - Simulate success/failure
/// - Optionally write a real input file for cleanup assertions
/// - Simulate a slow transfer that honors cancellation
#[derive(Debug, Clone)]
pub struct MockFetcher {
    /// Task ids fetched, in order.
    fetches: Arc<RwLock<Vec<String>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
    /// If set, fetch writes a real file here and returns its path.
    output_dir: Arc<RwLock<Option<PathBuf>>>,
    /// Simulated transfer duration in milliseconds.
    fetch_duration_ms: Arc<RwLock<u64>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self {
            fetches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            output_dir: Arc::new(RwLock::new(None)),
            fetch_duration_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all fetched task ids, in order.
    pub async fn recorded_fetches(&self) -> Vec<String> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Write real input files into `dir` instead of returning phantom paths.
    pub async fn set_output_dir(&self, dir: impl Into<PathBuf>) {
        *self.output_dir.write().await = Some(dir.into());
    }

    /// Set the simulated transfer duration.
    pub async fn set_fetch_duration(&self, duration: Duration) {
        *self.fetch_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<FetchError> {
        self.next_error.write().await.take()
    }

    /// Sleeps in small steps so a cancellation request lands quickly.
    async fn simulate_transfer(&self, cancel: &CancelScope) -> Result<(), FetchError> {
        let mut remaining = *self.fetch_duration_ms.read().await;
        while remaining > 0 {
            if cancel.is_requested() {
                return Err(FetchError::Cancelled);
            }
            let step = remaining.min(10);
            tokio::time::sleep(Duration::from_millis(step)).await;
            remaining -= step;
        }
        if cancel.is_requested() {
            return Err(FetchError::Cancelled);
        }
        Ok(())
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        task: &Task,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<PathBuf, FetchError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.simulate_transfer(cancel).await?;

        let sequence = {
            let mut fetches = self.fetches.write().await;
            fetches.push(task.id.clone());
            fetches.len()
        };

        let path = match self.output_dir.read().await.as_ref() {
            Some(dir) => {
                let path = dir.join(format!("input_{}.mkv", sequence));
                tokio::fs::write(&path, b"mock input data").await?;
                path
            }
            None => PathBuf::from(format!("/nonexistent/mock/input_{}.mkv", sequence)),
        };

        progress.report(TaskStage::Fetching, 15, 15).await;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressReporter;
    use crate::testing::MockMessenger;
    use tempfile::TempDir;

    async fn reporter(task: &Task) -> TaskReporter {
        ProgressReporter::new(Arc::new(MockMessenger::new()), Duration::from_secs(5))
            .begin(task)
            .await
    }

    #[tokio::test]
    async fn test_fetch_writes_real_file() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.set_output_dir(dir.path()).await;

        let task = Task::from_feed("Ep01", "http://x/1");
        let progress = reporter(&task).await;
        let cancel = CancelScope::new();

        let path = fetcher.fetch(&task, &cancel, &progress).await.unwrap();
        assert!(path.exists());
        assert_eq!(fetcher.recorded_fetches().await, vec!["http://x/1"]);
    }

    #[tokio::test]
    async fn test_fetch_honors_cancellation() {
        let fetcher = MockFetcher::new();
        fetcher.set_fetch_duration(Duration::from_secs(5)).await;

        let task = Task::from_feed("Ep01", "http://x/1");
        let progress = reporter(&task).await;
        let cancel = CancelScope::new();
        cancel.request();

        let err = fetcher.fetch(&task, &cancel, &progress).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(fetcher.fetch_count().await, 0);
    }

    #[tokio::test]
    async fn test_error_injection_is_consumed() {
        let fetcher = MockFetcher::new();
        fetcher
            .set_next_error(FetchError::Transfer("503".to_string()))
            .await;

        let task = Task::from_feed("Ep01", "http://x/1");
        let progress = reporter(&task).await;
        let cancel = CancelScope::new();

        assert!(fetcher.fetch(&task, &cancel, &progress).await.is_err());
        assert!(fetcher.fetch(&task, &cancel, &progress).await.is_ok());
    }
}
