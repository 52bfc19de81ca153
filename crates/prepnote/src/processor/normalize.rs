//! Whitespace canonicalization applied to every extracted string.

use std::sync::LazyLock;

use regex::Regex;

static RE_TRAILING_BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\n").unwrap());
static RE_EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Trims the text, drops horizontal whitespace before line breaks and folds
/// runs of three or more newlines into a single blank line.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let text = text.trim();
    let text = RE_TRAILING_BLANKS.replace_all(text, "\n");
    let text = RE_EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Sufficiency check shared by every extraction path.
pub fn is_text_enough(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}
