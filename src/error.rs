//! Error types for chat-platform and transfer failures.

use thiserror::Error;

/// Failures surfaced by a [`crate::client::ChatClient`] implementation.
///
/// Notification errors (`Api`) are almost always swallowed by callers after
/// logging; only the completion notice retries them. Transfer and I/O errors
/// abort the current job but never the worker loop.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Bot API rejected a request (send, edit, `get_file`).
    #[error("chat api request failed: {0}")]
    Api(#[from] teloxide::RequestError),

    /// The media byte stream failed mid-transfer.
    #[error("media transfer failed: {0}")]
    Transfer(#[from] teloxide::DownloadError),

    /// Writing the downloaded file to disk failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
