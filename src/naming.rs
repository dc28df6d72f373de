//! Filename resolution for incoming media.
//!
//! The on-disk name is derived, in priority order, from the media caption, a
//! recent pending text from the same sender, or a timestamp fallback. The
//! extension is taken from the declared original filename when one exists,
//! defaulting to `.mp4`.
//!
//! Identical resolved names are not disambiguated: a later job with the same
//! name overwrites the earlier file. This is deliberate and covered by tests.

#![allow(clippy::non_std_lazy_statics)]

use chrono::{DateTime, Local};
use lazy_regex::lazy_regex;
use tracing::debug;

use crate::utils::truncate_str;

/// Characters that are unsafe in filenames on common filesystems.
static RE_UNSAFE_CHARS: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r#"[<>:"/\\|?*]"#);

/// Maximum length of the filename stem, in characters.
const MAX_STEM_CHARS: usize = 100;

/// Format of the timestamp fallback stem.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Sanitizes a filename stem to be filesystem-friendly while keeping spaces.
///
/// Replaces each of `< > : " / \ | ? *` with `_`, strips surrounding
/// whitespace and truncates to 100 characters. Idempotent.
pub fn sanitize_file_stem(raw: &str) -> String {
    let replaced = RE_UNSAFE_CHARS.replace_all(raw, "_");
    // Trim again after truncation so a cut that lands on a space cannot
    // leave a trailing blank (keeps sanitization idempotent).
    truncate_str(replaced.trim(), MAX_STEM_CHARS)
        .trim_end()
        .to_string()
}

/// Picks the filename stem for an incoming media item.
///
/// `pending` is the already-consumed pending text for this sender, if one was
/// stored within the validity window; consumption happens at the call site so
/// that it stays one-shot.
pub fn resolve_file_stem(
    caption: Option<&str>,
    pending: Option<&str>,
    now: DateTime<Local>,
) -> String {
    if let Some(caption) = caption.map(str::trim).filter(|c| !c.is_empty()) {
        let stem = sanitize_file_stem(caption);
        debug!("Received filename as caption: {stem}");
        return stem;
    }
    if let Some(text) = pending.map(str::trim).filter(|t| !t.is_empty()) {
        let stem = sanitize_file_stem(text);
        debug!("Received filename as previous message: {stem}");
        return stem;
    }
    let stem = now.format(TIMESTAMP_FORMAT).to_string();
    debug!("No filename received, default: {stem}");
    stem
}

/// Resolves the extension from a declared original filename, `.mp4` if the
/// declaration is missing or carries no extension.
pub fn file_extension(declared_name: Option<&str>) -> String {
    declared_name
        .and_then(|name| std::path::Path::new(name).extension())
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".mp4".to_string())
}

/// Full resolved filename: sanitized stem plus extension.
pub fn resolve_file_name(
    caption: Option<&str>,
    pending: Option<&str>,
    declared_name: Option<&str>,
    now: DateTime<Local>,
) -> String {
    format!(
        "{}{}",
        resolve_file_stem(caption, pending, now),
        file_extension(declared_name)
    )
}
