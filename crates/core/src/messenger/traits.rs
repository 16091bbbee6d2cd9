//! Trait definition for the messenger boundary.

use async_trait::async_trait;
use std::path::Path;

use super::error::MessengerError;

/// Opaque reference to a previously sent message, used for later edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle(pub String);

impl MessageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// A chat transport that can display progress and deliver artifacts.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Returns the name of this transport implementation.
    fn name(&self) -> &str;

    /// Sends a new text message and returns a handle for later edits.
    async fn send(&self, text: &str) -> Result<MessageHandle, MessengerError>;

    /// Replaces the text of a previously sent message.
    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<(), MessengerError>;

    /// Delivers a file to the chat surface.
    async fn send_document(&self, path: &Path, caption: &str) -> Result<(), MessengerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoMessenger;

    #[async_trait]
    impl Messenger for EchoMessenger {
        fn name(&self) -> &str {
            "echo"
        }

        async fn send(&self, text: &str) -> Result<MessageHandle, MessengerError> {
            Ok(MessageHandle::new(format!("msg-{}", text.len())))
        }

        async fn edit(&self, _handle: &MessageHandle, _text: &str) -> Result<(), MessengerError> {
            Ok(())
        }

        async fn send_document(
            &self,
            _path: &Path,
            _caption: &str,
        ) -> Result<(), MessengerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_send_returns_handle() {
        let messenger = EchoMessenger;
        let handle = messenger.send("hello").await.unwrap();
        assert_eq!(handle, MessageHandle::new("msg-5"));
        messenger.edit(&handle, "updated").await.unwrap();
    }
}
