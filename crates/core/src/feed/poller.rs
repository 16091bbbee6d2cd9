//! Periodic feed poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::ledger::Ledger;
use crate::orchestrator::{EnqueueError, OrchestratorHandle};
use crate::task::Task;

use super::config::FeedConfig;
use super::traits::FeedClient;
use super::types::FeedItem;

/// Polls a feed client on an interval and enqueues unseen items.
pub struct FeedPoller<C: FeedClient> {
    client: C,
    handle: OrchestratorHandle,
    ledger: Arc<Ledger>,
    config: FeedConfig,
}

impl<C: FeedClient> FeedPoller<C> {
    pub fn new(
        client: C,
        handle: OrchestratorHandle,
        ledger: Arc<Ledger>,
        config: FeedConfig,
    ) -> Self {
        Self {
            client,
            handle,
            ledger,
            config,
        }
    }

    /// Runs the poll loop until a shutdown signal is received.
    ///
    /// Polls immediately on startup, then sleeps for the configured interval
    /// between polls, or for the backoff interval after an error.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Feed poller started, polling {} every {}s",
            self.client.name(),
            self.config.poll_interval_secs
        );

        loop {
            let sleep_for = match self.client.fetch_listing().await {
                Ok(items) => {
                    self.enqueue_new(items).await;
                    Duration::from_secs(self.config.poll_interval_secs)
                }
                Err(e) => {
                    warn!(
                        "Feed poll failed, retrying in {}s: {}",
                        self.config.error_backoff_secs, e
                    );
                    Duration::from_secs(self.config.error_backoff_secs)
                }
            };

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        info!("Feed poller stopped");
    }

    async fn enqueue_new(&self, items: Vec<FeedItem>) {
        for item in items {
            if self.ledger.contains(&item.link).await {
                continue;
            }
            let task = Task::from_feed(&item.title, &item.link);
            match self.handle.enqueue(task).await {
                Ok(()) => info!("Discovered '{}' from feed", item.title),
                Err(EnqueueError::Duplicate(_)) => {
                    debug!("Skipping '{}', already known", item.title)
                }
            }
        }
    }
}
