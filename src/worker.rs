//! Consumer side of the pipeline: the sequential download loop.
//!
//! A single worker pulls jobs in FIFO order and streams each one to disk.
//! Downloads are strictly serialized; the completion notice is the only
//! message retried indefinitely, and while it retries no further job is
//! dequeued. That trade-off is deliberate: guaranteed delivery of the final
//! status over throughput, since downloads are sequential anyway.

use std::sync::Arc;

use futures_util::StreamExt;
use teloxide::types::MessageId;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::ChatClient;
use crate::config::{COMPLETION_RETRY_INITIAL, COMPLETION_RETRY_MAX, PROGRESS_STEP_PERCENT};
use crate::error::ClientError;
use crate::progress::{render_progress, ProgressTracker};
use crate::queue::{DownloadJob, JobConsumer};

/// The single download consumer.
pub struct Worker<C> {
    client: Arc<C>,
    consumer: JobConsumer,
}

impl<C: ChatClient> Worker<C> {
    /// Binds the worker to its queue and chat client.
    pub fn new(client: Arc<C>, consumer: JobConsumer) -> Self {
        Self { client, consumer }
    }

    /// Runs until every producer handle is dropped and the queue drains.
    ///
    /// A failed download never stops the loop: the error is logged, the
    /// sender is notified best-effort, and the next job proceeds.
    pub async fn run(mut self) {
        while let Some(job) = self.consumer.dequeue().await {
            self.process(job).await;
            self.consumer.mark_done();
        }
        info!("Download queue closed, worker exiting");
    }

    async fn process(&self, job: DownloadJob) {
        let status = self.announce_start(&job).await;

        match self.stream_to_disk(&job, status).await {
            Ok(()) => self.confirm_completion(&job, status).await,
            Err(e) => {
                warn!("Download of \"{}\" failed: {e}", job.file_name);
                let body = format!("❌ Download failed: \"{}\" ({e})", job.file_name);
                if let Err(notify_err) = self.notify(&job, status, &body).await {
                    warn!("Unable to send message: {body} ({notify_err})");
                }
            }
        }
    }

    /// Announces the start of a download, re-acquiring a status message if
    /// the queued acknowledgment was never delivered.
    async fn announce_start(&self, job: &DownloadJob) -> Option<MessageId> {
        let body = format!("Downloading: \"{}\"...", job.file_name);
        info!("{body}");
        match job.status {
            Some(message) => {
                if let Err(e) = self.client.edit_message(job.chat, message, &body).await {
                    warn!("Unable to send message: {body} ({e})");
                }
                Some(message)
            }
            None => match self.client.send_message(job.chat, &body).await {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Unable to send message: {body} ({e})");
                    None
                }
            },
        }
    }

    async fn stream_to_disk(
        &self,
        job: &DownloadJob,
        status: Option<MessageId>,
    ) -> Result<(), ClientError> {
        let stream = self.client.fetch_media(&job.media).await?;
        let mut chunks = stream.chunks;
        let mut file = tokio::fs::File::create(&job.dest_path).await?;
        let mut tracker = ProgressTracker::new(PROGRESS_STEP_PERCENT);
        let mut received: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;

            if let Some(percent) = tracker.update(received, stream.total) {
                let body = render_progress(&job.file_name, percent, received, stream.total);
                if let Some(message) = status {
                    // A rejected progress edit never aborts the download.
                    if let Err(e) = self.client.edit_message(job.chat, message, &body).await {
                        warn!("Unable to send message: {body} ({e})");
                    }
                }
            }
        }

        file.flush().await?;
        Ok(())
    }

    /// Delivers the completion notice, retrying indefinitely with doubling
    /// backoff. Blocks the worker until it succeeds: the next job must not
    /// start before this one's final status reaches the sender.
    async fn confirm_completion(&self, job: &DownloadJob, status: Option<MessageId>) {
        let body = format!("✅ Download complete: `{}`", job.dest_path.display());
        let mut delay = COMPLETION_RETRY_INITIAL;

        loop {
            match self.notify(job, status, &body).await {
                Ok(_) => break,
                Err(e) => {
                    debug!("Download finished but can't send msg, waiting {delay:?}: {e}");
                    sleep(delay).await;
                    delay = (delay * 2).min(COMPLETION_RETRY_MAX);
                }
            }
        }
        info!("{body}");
    }

    /// Edits the status message when a handle exists, otherwise sends a new
    /// message and returns its handle.
    async fn notify(
        &self,
        job: &DownloadJob,
        status: Option<MessageId>,
        body: &str,
    ) -> Result<MessageId, ClientError> {
        match status {
            Some(message) => {
                self.client.edit_message(job.chat, message, body).await?;
                Ok(message)
            }
            None => self.client.send_message(job.chat, body).await,
        }
    }
}
