//! Utility functions for string truncation, timestamps and output directories.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe truncation for prompts and log previews
//! - UTC run timestamps used to key output filenames
//! - JSON error classification for model responses cut off mid-document
//! - File system validation for the output directory

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Format of the timestamp embedded in output filenames.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const WRITE_CHECK_FILE: &str = ".news_gap_write_check";

/// Keep the first `max` characters of `s`, appending `marker` if anything was cut.
///
/// Counts Unicode scalar values, never bytes, so multi-byte text is never
/// split inside a character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("short", 10, "..."), "short");
/// assert_eq!(truncate_chars("abcdef", 3, "..."), "abc...");
/// ```
pub fn truncate_chars(s: &str, max: usize, marker: &str) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}{}", &s[..cut], marker),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// a count of the characters left out.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        truncate_chars(s, max, &format!("…(+{} chars)", total - max))
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// Generative models sometimes stop mid-document when they hit their output
/// token limit; the parse then fails with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Render a UTC instant as a filename timestamp, e.g. `20250506_143000`.
pub fn run_timestamp(at: DateTime<Utc>) -> String {
    at.format(RUN_TIMESTAMP_FORMAT).to_string()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory (and parents) if missing, then writes and removes a
/// scratch file. Calling it on an existing writable directory is a no-op.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let check_path = path.join(WRITE_CHECK_FILE);
    stdfs::File::create(&check_path)?;
    remove_write_check(&check_path);
    info!("Output directory is writable");
    Ok(())
}

/// Remove the scratch file left by [`ensure_writable_dir`], warning if it
/// stays behind. Returns whether it was removed.
fn remove_write_check(path: &Path) -> bool {
    match stdfs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Could not remove write-check file; it will remain in the output directory"
            );
            false
        }
    }
}
