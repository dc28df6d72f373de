//! Telegram media download bot.
//!
//! Incoming videos and documents are queued and downloaded one at a time to a
//! configured folder, with progress reported back to the sender by editing a
//! status message. The pipeline is: [`ingress`] (producer) → [`queue`] →
//! [`worker`] (single consumer), with [`client`] as the seam to the Telegram
//! Bot API.

/// Narrow chat-platform seam: the [`client::ChatClient`] trait and its
/// teloxide-backed implementation.
pub mod client;
/// Settings, CLI flags and tuning constants.
pub mod config;
/// Error types shared across the pipeline.
pub mod error;
/// Producer side: turns inbound events into queued download jobs.
pub mod ingress;
/// Filename resolution and sanitization.
pub mod naming;
/// Per-sender pending-text storage with a validity window.
pub mod pending;
/// Throttled progress updates for in-flight downloads.
pub mod progress;
/// The FIFO job queue connecting ingress to the worker.
pub mod queue;
/// Retry helpers and small text utilities.
pub mod utils;
/// Consumer side: the sequential download loop.
pub mod worker;
