//! Word rules for advertisement text.
//!
//! Priority ads carry a literal `"0"` in front of their stored text; the print
//! layout reads it as the priority signal. Everything that counts or trims
//! words works on the marker-free body, and [`normalize_ad_text`] is the one
//! place that strips and re-applies the marker.

/// Prefix stored in front of the text of priority ads.
pub const PRIORITY_MARKER: &str = "0";

/// Number of whitespace-separated, non-empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the first `max_words` tokens joined by single spaces.
///
/// Text within the limit is returned unchanged apart from trimming.
/// `max_words == 0` disables the limit.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    if max_words == 0 || word_count(text) <= max_words {
        return text.trim().to_string();
    }
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prefix the priority marker exactly once.
pub fn apply_priority_marker(body: &str, priority: bool) -> String {
    if priority {
        format!("{PRIORITY_MARKER}{body}")
    } else {
        body.to_string()
    }
}

/// Remove exactly one leading marker from text stored with `priority` set.
pub fn strip_priority_marker(stored: &str, priority: bool) -> &str {
    if priority {
        stored.strip_prefix(PRIORITY_MARKER).unwrap_or(stored)
    } else {
        stored
    }
}

/// Single normalisation step applied on every write of ad text.
///
/// `text` is interpreted as stored with `was_priority`; the result is the
/// stored form for `now_priority`, truncated to `max_words` body words.
pub fn normalize_ad_text(
    text: &str,
    was_priority: bool,
    now_priority: bool,
    max_words: usize,
) -> String {
    let body = strip_priority_marker(text.trim_start(), was_priority);
    let body = truncate_words(body, max_words);
    apply_priority_marker(&body, now_priority)
}

/// Marker-free body of stored text.
pub fn body_of(stored: &str, priority: bool) -> &str {
    strip_priority_marker(stored, priority)
}
