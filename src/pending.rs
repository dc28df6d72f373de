//! Per-sender pending-text storage.
//!
//! When media is forwarded to the bot, the descriptive text sometimes arrives
//! as its own message just before the file. Each sender gets at most one
//! stored text; a newer text overwrites the older one, and the next media
//! message from that sender consumes it (one-shot) if it is still within the
//! validity window. Entries also age out of the cache on their own.

use std::time::Duration;

use moka::future::Cache;
use teloxide::types::ChatId;
use tokio::time::Instant;
use tracing::debug;

/// Upper bound on distinct senders with a stored text at once.
const MAX_TRACKED_SENDERS: u64 = 10_000;

#[derive(Clone)]
struct PendingNote {
    text: String,
    stored_at: Instant,
}

/// Keyed store of the last text-only message per sender.
///
/// Concurrent ingress invocations for different senders touch different keys;
/// same-sender store/take pairs go through the cache's own entry-level
/// synchronization, so no external locking is needed.
#[derive(Clone)]
pub struct PendingMessages {
    cache: Cache<ChatId, PendingNote>,
    window: Duration,
}

impl PendingMessages {
    /// Creates a store whose entries are valid for `window` after insertion.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_TRACKED_SENDERS)
                .time_to_live(window)
                .build(),
            window,
        }
    }

    /// Records `text` for `sender`, replacing any previous entry.
    pub async fn store(&self, sender: ChatId, text: String) {
        debug!("Storing pending text for {sender:?}");
        self.cache
            .insert(
                sender,
                PendingNote {
                    text,
                    stored_at: Instant::now(),
                },
            )
            .await;
    }

    /// Removes and returns the pending text for `sender` if it was stored
    /// within the validity window.
    ///
    /// The entry is removed even when it has expired: an expired text must
    /// not leak into a later media message either.
    pub async fn take(&self, sender: ChatId) -> Option<String> {
        let note = self.cache.remove(&sender).await?;
        if note.stored_at.elapsed() <= self.window {
            Some(note.text)
        } else {
            debug!("Pending text for {sender:?} expired");
            None
        }
    }
}
