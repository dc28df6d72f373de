//! The FIFO download queue connecting ingress to the worker.
//!
//! Unbounded multi-producer/single-consumer: `enqueue` never blocks or
//! rejects, `dequeue` waits for the next job, and `mark_done` feeds the
//! join/shutdown accounting. Insertion order is processing order, and at most
//! one job is in flight at a time because there is exactly one consumer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use teloxide::types::{ChatId, MessageId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tracing::error;

use crate::client::MediaRef;

/// One queued download request.
///
/// Owned by the queue until dequeued, then exclusively by the worker.
/// Immutable after creation except for the status-message handle, which the
/// worker re-acquires if the initial acknowledgment failed to send.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Chat the job came from; all status notices go back here.
    pub chat: ChatId,
    /// Handle to the media on the platform side.
    pub media: MediaRef,
    /// Resolved filename, already sanitized.
    pub file_name: String,
    /// Full on-disk destination, `download_folder/file_name`.
    pub dest_path: PathBuf,
    /// The "queued" acknowledgment message, if it was delivered.
    pub status: Option<MessageId>,
}

struct Shared {
    outstanding: AtomicUsize,
    drained: Notify,
}

/// Producer handle. Cheap to clone; used concurrently by ingress invocations.
#[derive(Clone)]
pub struct JobQueue {
    tx: UnboundedSender<DownloadJob>,
    shared: Arc<Shared>,
}

/// Consumer handle, held by the single download worker.
pub struct JobConsumer {
    rx: UnboundedReceiver<DownloadJob>,
    shared: Arc<Shared>,
}

/// Creates a connected producer/consumer pair.
#[must_use]
pub fn channel() -> (JobQueue, JobConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        outstanding: AtomicUsize::new(0),
        drained: Notify::new(),
    });
    (
        JobQueue {
            tx,
            shared: Arc::clone(&shared),
        },
        JobConsumer { rx, shared },
    )
}

impl JobQueue {
    /// Appends a job to the tail. Never blocks; the queue is unbounded.
    pub fn enqueue(&self, job: DownloadJob) {
        self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        if let Err(rejected) = self.tx.send(job) {
            // Only possible once the worker has shut down.
            self.shared.outstanding.fetch_sub(1, Ordering::SeqCst);
            error!(
                "Download worker is gone, dropping job for {}",
                rejected.0.file_name
            );
        }
    }

    /// Jobs enqueued but not yet marked done (queued + in flight).
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    /// Waits until every enqueued job has been marked done.
    pub async fn join(&self) {
        loop {
            let drained = self.shared.drained.notified();
            if self.shared.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            drained.await;
        }
    }
}

impl JobConsumer {
    /// Blocks until the head job is available; `None` once every producer
    /// handle has been dropped and the queue is empty.
    pub async fn dequeue(&mut self) -> Option<DownloadJob> {
        self.rx.recv().await
    }

    /// Signals completion of the most recently dequeued job.
    pub fn mark_done(&self) {
        if self.shared.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::FileId;

    fn job(name: &str) -> DownloadJob {
        DownloadJob {
            chat: ChatId(7),
            media: MediaRef {
                file_id: FileId(format!("file-{name}")),
            },
            file_name: name.to_string(),
            dest_path: PathBuf::from("/tmp").join(name),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, mut consumer) = channel();
        for name in ["a.mp4", "b.mp4", "c.mp4"] {
            queue.enqueue(job(name));
        }

        for expected in ["a.mp4", "b.mp4", "c.mp4"] {
            let got = consumer.dequeue().await.map(|j| j.file_name);
            assert_eq!(got.as_deref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_join_waits_for_mark_done() {
        let (queue, mut consumer) = channel();
        queue.enqueue(job("a.mp4"));
        queue.enqueue(job("b.mp4"));
        assert_eq!(queue.outstanding(), 2);

        let joiner = tokio::spawn({
            let queue = queue.clone();
            async move { queue.join().await }
        });

        for _ in 0..2 {
            let _ = consumer.dequeue().await;
            consumer.mark_done();
        }

        joiner.await.expect("join task panicked");
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_ends_after_producers_drop() {
        let (queue, mut consumer) = channel();
        queue.enqueue(job("only.mp4"));
        drop(queue);

        assert!(consumer.dequeue().await.is_some());
        assert!(consumer.dequeue().await.is_none());
    }
}
