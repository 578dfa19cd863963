//! Script detection for font selection.

use std::ops::RangeInclusive;

/// Unicode block of the Sinhala script.
pub const SINHALA_RANGE: RangeInclusive<char> = '\u{0D80}'..='\u{0DFF}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Sinhala,
}

fn is_sinhala(c: char) -> bool {
    SINHALA_RANGE.contains(&c)
}

/// Whether any character of `text` has to be drawn with the Sinhala font.
pub fn needs_sinhala_font(text: &str) -> bool {
    text.chars().any(is_sinhala)
}

/// Split text into maximal runs of one script.
///
/// Whitespace, digits and punctuation join the run they appear in so a
/// mixed line produces as few font switches as possible.
pub fn split_runs(text: &str) -> Vec<(Script, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<Script> = None;

    for (idx, c) in text.char_indices() {
        let script = if is_sinhala(c) {
            Some(Script::Sinhala)
        } else if c.is_alphabetic() {
            Some(Script::Latin)
        } else {
            None
        };
        match (current, script) {
            (Some(cur), Some(next)) if cur != next => {
                runs.push((cur, &text[start..idx]));
                start = idx;
                current = Some(next);
            }
            (None, Some(next)) => current = Some(next),
            _ => {}
        }
    }
    if start < text.len() {
        runs.push((current.unwrap_or(Script::Latin), &text[start..]));
    }
    runs
}
