//! Status message handling for one download request
//!
//! A single "Processing..." message is edited at every checkpoint. If an
//! edit fails (message deleted, too old, flood control), a fresh message is
//! sent and becomes the one edited from then on. On success the status
//! message is removed and only the document stays in the chat; on failure it
//! is replaced by the user-facing error text.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};

use spidycore::download::progress::{user_message, PROCESSING_MESSAGE};
use spidycore::{Artifact, DownloadError, DownloadStatus, ProgressSink};

/// Edits with this error text are treated as already applied
const NOT_MODIFIED: &str = "message is not modified";

pub struct TelegramReporter {
    bot: Bot,
    chat_id: ChatId,
    /// Status message ID (None if not sent or sending failed)
    message_id: Option<MessageId>,
}

impl TelegramReporter {
    /// Reporter without a status message. The final outcome is sent as a fresh message.
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            message_id: None,
        }
    }

    /// Sends the initial "Processing..." message.
    pub async fn start(bot: Bot, chat_id: ChatId) -> Self {
        let mut reporter = Self::new(bot, chat_id);
        match reporter.bot.send_message(chat_id, PROCESSING_MESSAGE).await {
            Ok(msg) => reporter.message_id = Some(msg.id),
            Err(e) => log::warn!("Failed to send status message to chat {}: {}", chat_id, e),
        }
        reporter
    }

    /// Shows `text` in the status message, sending a new one if editing fails.
    async fn show(&mut self, text: String) -> Result<(), teloxide::RequestError> {
        if let Some(msg_id) = self.message_id {
            match self.bot.edit_message_text(self.chat_id, msg_id, text.clone()).await {
                Ok(_) => return Ok(()),
                Err(e) if e.to_string().contains(NOT_MODIFIED) => return Ok(()),
                Err(e) => log::warn!("Failed to edit status message: {}. Sending a new one.", e),
            }
        }

        let msg = self.bot.send_message(self.chat_id, text).await?;
        self.message_id = Some(msg.id);
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for TelegramReporter {
    async fn checkpoint(&mut self, status: DownloadStatus) {
        if let Err(e) = self.show(status.to_message()).await {
            log::warn!("Failed to report {} to chat {}: {}", status.as_str(), self.chat_id, e);
        }
    }

    async fn deliver(&mut self, artifact: &Artifact) -> Result<(), DownloadError> {
        let document = InputFile::file(artifact.path.clone()).file_name(artifact.file_name.clone());
        let request = self.bot.send_document(self.chat_id, document);
        let request = match &artifact.caption {
            Some(caption) => request.caption(caption.clone()),
            None => request,
        };

        request
            .await
            .map(|_| ())
            .map_err(|e| DownloadError::DeliveryFailed(e.to_string()))
    }

    async fn finish(&mut self, outcome: &Result<(), DownloadError>) {
        match outcome {
            Ok(()) => {
                if let Some(msg_id) = self.message_id.take() {
                    if let Err(e) = self.bot.delete_message(self.chat_id, msg_id).await {
                        log::warn!("Failed to delete status message in chat {}: {}", self.chat_id, e);
                    }
                }
            }
            Err(err) => {
                if let Err(e) = self.show(user_message(err)).await {
                    log::error!("Failed to deliver failure message to chat {}: {}", self.chat_id, e);
                }
            }
        }
    }
}
