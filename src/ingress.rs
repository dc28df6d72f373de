//! Producer side of the pipeline.
//!
//! Invoked once per inbound event. Text-only messages are remembered as a
//! possible filename for the sender's next media message; videos and
//! documents become queued download jobs; everything else gets a rejection
//! notice. No outbound send failure here may prevent a job from being
//! enqueued or crash the handler.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use teloxide::types::ChatId;
use tracing::{info, warn};

use crate::client::{ChatClient, Inbound, InboundEvent, MediaRef};
use crate::naming;
use crate::pending::PendingMessages;
use crate::queue::{DownloadJob, JobQueue};

/// Shared ingress state: one instance serves all concurrent dispatches.
pub struct Ingress<C> {
    client: Arc<C>,
    pending: PendingMessages,
    queue: JobQueue,
    download_root: PathBuf,
}

impl<C: ChatClient> Ingress<C> {
    /// Wires the producer to its collaborators.
    pub fn new(
        client: Arc<C>,
        pending: PendingMessages,
        queue: JobQueue,
        download_root: PathBuf,
    ) -> Self {
        Self {
            client,
            pending,
            queue,
            download_root,
        }
    }

    /// Routes one inbound event.
    pub async fn handle_event(&self, event: InboundEvent) {
        match event.kind {
            Inbound::Text { body } => {
                // Forwarded media often arrives right after its description;
                // keep the text around as a filename candidate.
                self.pending.store(event.sender, body).await;
            }
            Inbound::Media {
                media,
                caption,
                declared_name,
            } => {
                self.handle_media(event.sender, media, caption, declared_name)
                    .await;
            }
            Inbound::Unsupported => {
                let body = "🗙 Unable to manage message, send videos or documents.";
                info!("{body}");
                if let Err(e) = self.client.send_message(event.sender, body).await {
                    warn!("Unable to send rejection notice to {}: {e}", event.sender.0);
                }
            }
        }
    }

    async fn handle_media(
        &self,
        sender: ChatId,
        media: MediaRef,
        caption: Option<String>,
        declared_name: Option<String>,
    ) {
        let caption = caption.as_deref().map(str::trim).filter(|c| !c.is_empty());
        // A caption names this file outright; only an uncaptioned item
        // consumes the sender's pending text, so a stored text still names
        // the next uncaptioned media after a captioned one.
        let pending_text = if caption.is_some() {
            None
        } else {
            self.pending.take(sender).await
        };
        let file_name = naming::resolve_file_name(
            caption,
            pending_text.as_deref(),
            declared_name.as_deref(),
            Local::now(),
        );
        let dest_path = self.download_root.join(&file_name);

        let body = format!("📥 Queued {file_name} for download.");
        info!("{body}");
        // Best effort: a failed acknowledgment must never block the job.
        let status = match self.client.send_message(sender, &body).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Unable to send message: {body} ({e})");
                None
            }
        };

        self.queue.enqueue(DownloadJob {
            chat: sender,
            media,
            file_name,
            dest_path,
            status,
        });
    }
}
