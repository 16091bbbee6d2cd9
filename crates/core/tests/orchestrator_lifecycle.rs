//! Orchestrator lifecycle integration tests.
//!
//! These tests drive real tasks through the full stage sequence with mock
//! stage runners: pending -> fetching -> transcoding -> publishing -> done,
//! plus the failure, cancellation and dedup paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use encodarr_core::{
    testing::{MockFetcher, MockMessenger, MockPublisher, MockTranscoder},
    Ledger, Messenger, Orchestrator, OrchestratorConfig, OrchestratorHandle, ProgressReporter,
    Task, TaskStage,
};

/// Test helper wiring an orchestrator to mock stage runners.
struct TestHarness {
    handle: OrchestratorHandle,
    orchestrator: Arc<Orchestrator<MockFetcher, MockTranscoder, MockPublisher>>,
    ledger: Arc<Ledger>,
    messenger: Arc<MockMessenger>,
    fetcher: MockFetcher,
    transcoder: MockTranscoder,
    publisher: MockPublisher,
    incoming_dir: PathBuf,
    outgoing_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let incoming_dir = temp_dir.path().join("incoming");
        let outgoing_dir = temp_dir.path().join("outgoing");
        tokio::fs::create_dir_all(&incoming_dir).await.unwrap();
        tokio::fs::create_dir_all(&outgoing_dir).await.unwrap();

        let ledger = Arc::new(
            Ledger::load(temp_dir.path().join("test.ledger"))
                .await
                .expect("Failed to load ledger"),
        );

        let messenger = Arc::new(MockMessenger::new());
        let fetcher = MockFetcher::new();
        fetcher.set_output_dir(&incoming_dir).await;
        let transcoder = MockTranscoder::new();
        let publisher = MockPublisher::new();

        let reporter = Arc::new(ProgressReporter::new(
            Arc::clone(&messenger) as Arc<dyn Messenger>,
            Duration::from_millis(0),
        ));

        let config = OrchestratorConfig {
            outgoing_dir: outgoing_dir.clone(),
            history_limit: 50,
        };

        let orchestrator = Arc::new(Orchestrator::new(
            config,
            Arc::clone(&ledger),
            fetcher.clone(),
            transcoder.clone(),
            publisher.clone(),
            reporter,
        ));
        let handle = orchestrator.handle();

        let run_loop = Arc::clone(&orchestrator);
        tokio::spawn(async move { run_loop.run().await });

        Self {
            handle,
            orchestrator,
            ledger,
            messenger,
            fetcher,
            transcoder,
            publisher,
            incoming_dir,
            outgoing_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Polls until `id` reaches a terminal stage or the timeout elapses.
    async fn wait_for_terminal(&self, id: &str, timeout: Duration) -> Option<TaskStage> {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if let Some(stage) = self.handle.terminal_stage(id).await {
                return Some(stage);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    /// Polls until the active task reaches `stage` or the timeout elapses.
    async fn wait_for_active_stage(&self, stage: TaskStage, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            let status = self.handle.status().await;
            if status.active.map(|a| a.stage) == Some(stage) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
    }
}

#[tokio::test]
async fn test_task_runs_to_done() {
    let harness = TestHarness::new().await;

    let task = Task::from_feed("Ep01", "http://feed/ep01");
    harness.handle.enqueue(task).await.unwrap();

    let stage = harness
        .wait_for_terminal("http://feed/ep01", Duration::from_secs(5))
        .await;
    assert_eq!(stage, Some(TaskStage::Done));

    // Every stage ran exactly once.
    assert_eq!(harness.fetcher.fetch_count().await, 1);
    assert_eq!(harness.transcoder.transcode_count().await, 1);
    assert_eq!(harness.publisher.publish_count().await, 1);

    // Only successful publishes enter the ledger.
    assert!(harness.ledger.contains("http://feed/ep01").await);

    // Local artifacts are gone.
    assert_eq!(TestHarness::file_count(&harness.incoming_dir), 0);
    assert_eq!(TestHarness::file_count(&harness.outgoing_dir), 0);

    // The status message ends on the completion edit.
    let edits = harness.messenger.edited_messages().await;
    assert!(edits.last().unwrap().1.contains("✅ Process complete"));
}

#[tokio::test]
async fn test_published_artifact_is_the_encoded_output() {
    let harness = TestHarness::new().await;

    harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await
        .unwrap();
    harness
        .wait_for_terminal("http://feed/ep01", Duration::from_secs(5))
        .await;

    let published = harness.publisher.recorded_publishes().await;
    assert_eq!(published.len(), 1);
    assert!(published[0]
        .1
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("encoded_"));
    assert!(published[0].1.starts_with(&harness.outgoing_dir));
}

#[tokio::test]
async fn test_failed_transcode_does_not_poison_queue() {
    let harness = TestHarness::new().await;
    harness
        .transcoder
        .set_next_error(encodarr_core::TranscodeError::ExitStatus {
            code: Some(1),
            stderr: "boom".to_string(),
        })
        .await;

    harness
        .handle
        .enqueue(Task::from_feed("Bad", "http://feed/bad"))
        .await
        .unwrap();
    harness
        .handle
        .enqueue(Task::from_feed("Good", "http://feed/good"))
        .await
        .unwrap();

    let bad = harness
        .wait_for_terminal("http://feed/bad", Duration::from_secs(5))
        .await;
    let good = harness
        .wait_for_terminal("http://feed/good", Duration::from_secs(5))
        .await;
    assert_eq!(bad, Some(TaskStage::Failed));
    assert_eq!(good, Some(TaskStage::Done));

    // Only the successful task is committed.
    assert!(!harness.ledger.contains("http://feed/bad").await);
    assert!(harness.ledger.contains("http://feed/good").await);

    // The fetched input of the failed task is cleaned up too.
    assert_eq!(TestHarness::file_count(&harness.incoming_dir), 0);

    // The failure was reported with its stage name.
    let edits = harness.messenger.edited_messages().await;
    assert!(edits
        .iter()
        .any(|(_, text)| text.contains("❌ Encoding failed")));
}

#[tokio::test]
async fn test_duplicate_enqueue_rejected() {
    let harness = TestHarness::new().await;
    harness
        .transcoder
        .set_transcode_duration(Duration::from_secs(10))
        .await;

    harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await
        .unwrap();

    // Same id again while queued or active.
    let result = harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await;
    assert!(result.is_err());

    harness.handle.cancel_active().await;
    harness
        .wait_for_terminal("http://feed/ep01", Duration::from_secs(5))
        .await;
}

#[tokio::test]
async fn test_completed_task_rejected_via_ledger() {
    let harness = TestHarness::new().await;

    harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await
        .unwrap();
    harness
        .wait_for_terminal("http://feed/ep01", Duration::from_secs(5))
        .await;

    let result = harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await;
    assert!(result.is_err());
    assert_eq!(harness.fetcher.fetch_count().await, 1);
}

#[tokio::test]
async fn test_cancel_mid_transcode() {
    let harness = TestHarness::new().await;
    harness
        .transcoder
        .set_transcode_duration(Duration::from_secs(30))
        .await;

    harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await
        .unwrap();
    assert!(
        harness
            .wait_for_active_stage(TaskStage::Transcoding, Duration::from_secs(5))
            .await
    );

    assert!(harness.handle.cancel_active().await);

    let stage = harness
        .wait_for_terminal("http://feed/ep01", Duration::from_secs(5))
        .await;
    assert_eq!(stage, Some(TaskStage::Cancelled));

    // A cancelled task never enters the ledger and leaves nothing behind.
    assert!(!harness.ledger.contains("http://feed/ep01").await);
    assert_eq!(harness.publisher.publish_count().await, 0);
    assert_eq!(TestHarness::file_count(&harness.incoming_dir), 0);

    let edits = harness.messenger.edited_messages().await;
    assert!(edits.last().unwrap().1.contains("🚫 Cancelled"));
}

#[tokio::test]
async fn test_skip_abandons_active_but_keeps_queue() {
    let harness = TestHarness::new().await;
    harness
        .transcoder
        .set_transcode_duration(Duration::from_secs(30))
        .await;

    harness
        .handle
        .enqueue(Task::from_feed("First", "http://feed/1"))
        .await
        .unwrap();
    harness
        .handle
        .enqueue(Task::from_feed("Second", "http://feed/2"))
        .await
        .unwrap();
    assert!(
        harness
            .wait_for_active_stage(TaskStage::Transcoding, Duration::from_secs(5))
            .await
    );

    // Let the queued task run instantly once it is promoted.
    harness
        .transcoder
        .set_transcode_duration(Duration::from_millis(0))
        .await;
    assert!(harness.handle.skip_active().await);

    assert_eq!(
        harness
            .wait_for_terminal("http://feed/1", Duration::from_secs(5))
            .await,
        Some(TaskStage::Cancelled)
    );
    assert_eq!(
        harness
            .wait_for_terminal("http://feed/2", Duration::from_secs(5))
            .await,
        Some(TaskStage::Done)
    );
    assert!(harness.ledger.contains("http://feed/2").await);
}

#[tokio::test]
async fn test_cancel_with_queue_clear() {
    let harness = TestHarness::new().await;
    harness
        .transcoder
        .set_transcode_duration(Duration::from_secs(30))
        .await;

    for i in 1..=3 {
        harness
            .handle
            .enqueue(Task::from_feed(&format!("Ep{i}"), &format!("http://feed/{i}")))
            .await
            .unwrap();
    }
    assert!(
        harness
            .wait_for_active_stage(TaskStage::Transcoding, Duration::from_secs(5))
            .await
    );

    // The "cancel" command: drop the backlog, then abort the active task.
    assert_eq!(harness.handle.clear_queue().await, 2);
    assert!(harness.handle.cancel_active().await);

    assert_eq!(
        harness
            .wait_for_terminal("http://feed/1", Duration::from_secs(5))
            .await,
        Some(TaskStage::Cancelled)
    );
    assert!(harness.handle.is_idle().await);
    assert_eq!(harness.fetcher.fetch_count().await, 1);
}

#[tokio::test]
async fn test_tasks_run_in_submission_order() {
    let harness = TestHarness::new().await;

    for i in 1..=3 {
        harness
            .handle
            .enqueue(Task::from_feed(&format!("Ep{i}"), &format!("http://feed/{i}")))
            .await
            .unwrap();
    }
    for i in 1..=3 {
        harness
            .wait_for_terminal(&format!("http://feed/{i}"), Duration::from_secs(5))
            .await;
    }

    assert_eq!(
        harness.fetcher.recorded_fetches().await,
        vec!["http://feed/1", "http://feed/2", "http://feed/3"]
    );

    let history = harness.handle.history().await;
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|h| h.stage == TaskStage::Done));
}

#[tokio::test]
async fn test_stop_ends_run_loop() {
    let harness = TestHarness::new().await;

    harness
        .handle
        .enqueue(Task::from_feed("Ep01", "http://feed/ep01"))
        .await
        .unwrap();
    harness
        .wait_for_terminal("http://feed/ep01", Duration::from_secs(5))
        .await;

    harness.orchestrator.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // After stop, new work is accepted into the queue but never promoted.
    harness
        .handle
        .enqueue(Task::from_feed("Ep02", "http://feed/ep02"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.handle.status().await.queue_len, 1);
}
