use std::borrow::Cow;

use crate::processor::normalize::normalize;

/// Decodes a plain-text upload. Invalid UTF-8 sequences are replaced rather
/// than rejected.
pub fn extract_text(data: &[u8]) -> String {
    let decoded = match std::str::from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            tracing::debug!("Upload is not valid UTF-8 ({}); decoding lossily", e);
            String::from_utf8_lossy(data)
        }
    };

    normalize(decoded.trim_start_matches('\u{feff}'))
}
