//! Mock messenger for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::messenger::{MessageHandle, Messenger, MessengerError};

/// Mock implementation of the Messenger trait.
///
/// Records every send, edit and document delivery for assertions, and can be
/// primed to fail the next call.
#[derive(Debug)]
pub struct MockMessenger {
    sent: Arc<RwLock<Vec<String>>>,
    edits: Arc<RwLock<Vec<(MessageHandle, String)>>>,
    documents: Arc<RwLock<Vec<(PathBuf, String)>>>,
    next_error: Arc<RwLock<Option<MessengerError>>>,
    next_id: Arc<RwLock<u64>>,
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMessenger {
    /// Create a new mock messenger.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            edits: Arc::new(RwLock::new(Vec::new())),
            documents: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_id: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all sent message texts, in order.
    pub async fn sent_messages(&self) -> Vec<String> {
        self.sent.read().await.clone()
    }

    /// Get all edits as (handle, new text) pairs, in order.
    pub async fn edited_messages(&self) -> Vec<(MessageHandle, String)> {
        self.edits.read().await.clone()
    }

    /// Get all delivered documents as (path, caption) pairs, in order.
    pub async fn sent_documents(&self) -> Vec<(PathBuf, String)> {
        self.documents.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: MessengerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<MessengerError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, text: &str) -> Result<MessageHandle, MessengerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let handle = MessageHandle::new(format!("m{}", *next_id));
        drop(next_id);

        self.sent.write().await.push(text.to_string());
        Ok(handle)
    }

    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<(), MessengerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.edits
            .write()
            .await
            .push((handle.clone(), text.to_string()));
        Ok(())
    }

    async fn send_document(&self, path: &Path, caption: &str) -> Result<(), MessengerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.documents
            .write()
            .await
            .push((path.to_path_buf(), caption.to_string()));
        Ok(())
    }
}
