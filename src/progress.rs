//! Throttled progress reporting for in-flight downloads.
//!
//! Telegram rate-limits message edits aggressively, so the tracker only asks
//! for an update when the transferred percentage crosses a multiple of the
//! configured step. With the default step of 5 that is at most ~20 edits per
//! file, independent of file size or chunk cadence.

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Decides when a progress update is worth sending.
///
/// Emission happens only when the integer percentage is a multiple of the
/// step and was not already announced. The render itself is separate so it
/// can be tested without a live transfer.
#[derive(Debug)]
pub struct ProgressTracker {
    step_percent: u8,
    last_emitted: Option<u8>,
}

impl ProgressTracker {
    /// Creates a tracker emitting at multiples of `step_percent`.
    #[must_use]
    pub fn new(step_percent: u8) -> Self {
        Self {
            step_percent: step_percent.max(1),
            last_emitted: None,
        }
    }

    /// Feeds the cumulative byte count; returns the percentage to announce,
    /// if this update should be announced at all.
    pub fn update(&mut self, current: u64, total: u64) -> Option<u8> {
        if total == 0 {
            return None;
        }
        let percent = u8::try_from(current.saturating_mul(100) / total).unwrap_or(100);
        if percent % self.step_percent != 0 || self.last_emitted == Some(percent) {
            return None;
        }
        self.last_emitted = Some(percent);
        Some(percent)
    }
}

/// Renders the user-visible progress line for a status-message edit.
#[must_use]
pub fn render_progress(file_name: &str, percent: u8, current: u64, total: u64) -> String {
    format!(
        "⬇ Downloading: \"{file_name}\"... {percent}% ({:.2} MB / {:.2} MB)",
        current as f64 / BYTES_PER_MIB,
        total as f64 / BYTES_PER_MIB,
    )
}
