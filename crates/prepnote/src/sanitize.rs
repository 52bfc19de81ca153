//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Upload filenames are client-supplied and may carry directory components
//! from the uploader's machine; spans only ever see the final component.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Returns only the last path component of a client-supplied filename,
/// treating both `/` and `\` as separators.
pub fn redact_filename(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Short deterministic hash of a text body, for correlating log lines
/// without logging the text itself.
pub fn hash_text(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
