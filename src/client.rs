//! Narrow seam to the chat platform.
//!
//! The pipeline only ever talks to Telegram through [`ChatClient`]: sending
//! and editing status messages and fetching a media byte stream. Keeping the
//! seam this small lets the queue, ingress and worker run against a scripted
//! client in tests, and keeps protocol details out of the core.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, MessageId};
use teloxide::DownloadError;

use crate::error::ClientError;

/// Opaque handle to a media item on the platform side.
#[derive(Debug, Clone)]
pub struct MediaRef {
    /// Bot API file identifier, valid for the lifetime of the bot session.
    pub file_id: FileId,
}

/// A media payload opened for streaming.
pub struct MediaStream {
    /// Declared total size in bytes.
    pub total: u64,
    /// Chunked body; cumulative delivered bytes never exceed `total`.
    pub chunks: BoxStream<'static, Result<Bytes, ClientError>>,
}

/// What an inbound event carries, after platform-specific decoding.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A plain text message with no attachment.
    Text {
        /// The message body.
        body: String,
    },
    /// A video or generic document.
    Media {
        /// Handle used to fetch the payload.
        media: MediaRef,
        /// Caption attached to the media message, if any.
        caption: Option<String>,
        /// Original filename declared by the uploader, if any.
        declared_name: Option<String>,
    },
    /// Anything else (stickers, photos, locations, ...).
    Unsupported,
}

/// One decoded inbound event.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Originating chat; all status notices are addressed back to it.
    pub sender: ChatId,
    /// Decoded payload.
    pub kind: Inbound,
}

impl InboundEvent {
    /// Decodes a Telegram message into the pipeline's event shape.
    ///
    /// A caption only counts as text when it rides on a video or document;
    /// a captioned photo is still unsupported, matching the acceptance rule
    /// "videos and documents only".
    #[must_use]
    pub fn from_message(msg: &Message) -> Self {
        let kind = if let Some(video) = msg.video() {
            Inbound::Media {
                media: MediaRef {
                    file_id: video.file.id.clone(),
                },
                caption: msg.caption().map(ToOwned::to_owned),
                declared_name: video.file_name.clone(),
            }
        } else if let Some(doc) = msg.document() {
            Inbound::Media {
                media: MediaRef {
                    file_id: doc.file.id.clone(),
                },
                caption: msg.caption().map(ToOwned::to_owned),
                declared_name: doc.file_name.clone(),
            }
        } else if let Some(text) = msg.text() {
            Inbound::Text {
                body: text.to_owned(),
            }
        } else {
            Inbound::Unsupported
        };

        Self {
            sender: msg.chat.id,
            kind,
        }
    }
}

/// The chat-platform capability required by the pipeline.
#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Sends a new message, returning its handle for later edits.
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, ClientError>;

    /// Replaces the text of a previously sent message.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), ClientError>;

    /// Opens the media payload for streaming.
    async fn fetch_media(&self, media: &MediaRef) -> Result<MediaStream, ClientError>;
}

/// Production [`ChatClient`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    /// Wraps a teloxide [`Bot`].
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, ClientError> {
        let msg = self.bot.send_message(chat, text).await?;
        Ok(msg.id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), ClientError> {
        self.bot.edit_message_text(chat, message, text).await?;
        Ok(())
    }

    async fn fetch_media(&self, media: &MediaRef) -> Result<MediaStream, ClientError> {
        // get_file is metadata-only; transient failures here are retried with
        // bounded backoff before any bytes flow.
        let file = crate::utils::retry_telegram_operation(|| async {
            self.bot
                .get_file(media.file_id.clone())
                .await
                .map_err(ClientError::Api)
        })
        .await?;

        // The raw stream yields reqwest errors; fold them into the same
        // DownloadError shape the non-streaming download path produces.
        let chunks = self
            .bot
            .download_file_stream(&file.path)
            .map(|chunk| {
                chunk.map_err(|e| ClientError::Transfer(DownloadError::Network(e.into())))
            })
            .boxed();

        Ok(MediaStream {
            total: u64::from(file.meta.size),
            chunks,
        })
    }
}

/// Ensures the download root exists, creating parents as needed.
///
/// # Errors
///
/// Returns the underlying I/O error if creation fails.
pub async fn ensure_download_root(root: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(root).await
}
