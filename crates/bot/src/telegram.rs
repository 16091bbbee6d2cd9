//! Telegram Bot API client and the [`Messenger`] implementation on top of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use encodarr_core::{sanitize_filename, MessageHandle, Messenger, MessengerError};

/// Thin client for the Bot API methods the bot needs.
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    file_base: String,
    chat_id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// One long-poll update.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

/// An incoming chat message, reduced to the fields the command loop reads.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Attachment>,
    #[serde(default)]
    pub video: Option<Attachment>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Attachment {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

impl TelegramClient {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: format!("https://api.telegram.org/bot{}", token),
            file_base: format!("https://api.telegram.org/file/bot{}", token),
            chat_id,
        }
    }

    /// The chat this bot is bound to.
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, MessengerError> {
        let url = format!("{}/{}", self.api_base, method);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?;

        if !parsed.ok {
            return Err(MessengerError::Api(
                parsed
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            ));
        }
        parsed
            .result
            .ok_or_else(|| MessengerError::Api(format!("{} returned no result", method)))
    }

    pub async fn send_message(&self, text: &str) -> Result<i64, MessengerError> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": self.chat_id, "text": text }),
            )
            .await?;
        Ok(sent.message_id)
    }

    pub async fn edit_message_text(
        &self,
        message_id: i64,
        text: &str,
    ) -> Result<(), MessengerError> {
        let result: Result<SentMessage, MessengerError> = self
            .call(
                "editMessageText",
                &serde_json::json!({
                    "chat_id": self.chat_id,
                    "message_id": message_id,
                    "text": text,
                }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // Re-sending identical text is not an error worth surfacing.
            Err(MessengerError::Api(desc)) if desc.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn send_document(&self, path: &Path, caption: &str) -> Result<(), MessengerError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let url = format!("{}/sendDocument", self.api_base);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?;

        let parsed: ApiResponse<SentMessage> = response
            .json()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?;
        if !parsed.ok {
            return Err(MessengerError::Api(
                parsed
                    .description
                    .unwrap_or_else(|| "sendDocument failed".to_string()),
            ));
        }
        Ok(())
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, MessengerError> {
        let body = serde_json::to_value(GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        })
        .map_err(|e| MessengerError::Api(e.to_string()))?;
        self.call("getUpdates", &body).await
    }

    /// Downloads an attachment into `dest_dir` and returns its local path.
    pub async fn download_file(
        &self,
        file_id: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, MessengerError> {
        let info: FileInfo = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let remote_path = info
            .file_path
            .ok_or_else(|| MessengerError::Api("getFile returned no file_path".to_string()))?;

        let url = format!("{}/{}", self.file_base, remote_path);
        debug!("Downloading attachment {}", remote_path);
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| MessengerError::Transport(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?;

        let dest = attachment_dest(dest_dir, file_name);
        tokio::fs::write(&dest, &bytes).await?;
        Ok(dest)
    }
}

/// Local path for a downloaded attachment. The name is client-supplied, so
/// it goes through the same sanitization as fetched file names.
fn attachment_dest(dest_dir: &Path, file_name: &str) -> PathBuf {
    dest_dir.join(sanitize_filename(file_name))
}

/// [`Messenger`] implementation backed by a [`TelegramClient`].
pub struct TelegramMessenger {
    client: Arc<TelegramClient>,
}

impl TelegramMessenger {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<MessageHandle, MessengerError> {
        let message_id = self.client.send_message(text).await?;
        Ok(MessageHandle::new(message_id.to_string()))
    }

    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<(), MessengerError> {
        let message_id: i64 = handle
            .0
            .parse()
            .map_err(|_| MessengerError::Api(format!("invalid message handle: {}", handle.0)))?;
        self.client.edit_message_text(message_id, text).await
    }

    async fn send_document(&self, path: &Path, caption: &str) -> Result<(), MessengerError> {
        self.client.send_document(path, caption).await
    }
}
