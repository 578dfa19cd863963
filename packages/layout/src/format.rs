use common::ColorOption;

use crate::grid::Placement;
use crate::publisher::{DigitSlots, Point};

pub const MAX_NAME_CHARS: usize = 40;
pub const WRAP_WIDTH_CHARS: usize = 48;
pub const MAX_WRAPPED_LINES: usize = 12;

const PHONE_DIGITS: usize = 10;

/// Shorten long names to initials plus surname.
///
/// "Kankanamge Don Nimal Perera" becomes "K. D. N. Perera"; names of up to
/// three words are kept. The result never exceeds [`MAX_NAME_CHARS`].
pub fn abbreviate_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let full = if parts.len() > 3 {
        let (last, rest) = parts.split_last().map(|(l, r)| (*l, r)).unwrap_or(("", &[]));
        let mut out: Vec<String> = rest
            .iter()
            .filter_map(|p| p.chars().next())
            .map(|c| format!("{}.", c.to_uppercase()))
            .collect();
        out.push(last.to_string());
        out.join(" ")
    } else {
        parts.join(" ")
    };
    full.chars().take(MAX_NAME_CHARS).collect()
}

/// Local 10-digit form of a Sri Lankan phone number.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let local = if let Some(rest) = digits.strip_prefix("0094") {
        format!("0{rest}")
    } else if let Some(rest) = digits.strip_prefix("94") {
        format!("0{rest}")
    } else {
        digits
    };
    let skip = local.chars().count().saturating_sub(PHONE_DIGITS);
    local.chars().skip(skip).collect()
}

/// One character per configured box; extra characters are dropped.
pub fn digit_slots(value: &str, slots: &DigitSlots) -> Vec<Placement> {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .zip(&slots.xs)
        .map(|(c, x)| Placement {
            text: c.to_string(),
            at: Point { x: *x, y: slots.y },
        })
        .collect()
}

pub fn color_label(color: ColorOption) -> &'static str {
    color.label()
}

fn hard_split(word: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// Greedy word wrap by character count.
///
/// Words longer than a line are split; lines beyond `max_lines` are dropped.
pub fn wrap_lines(text: &str, width_chars: usize, max_lines: usize) -> Vec<String> {
    let width = width_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for piece in hard_split(word, width) {
            let needed = if current.is_empty() {
                piece.chars().count()
            } else {
                current.chars().count() + 1 + piece.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(max_lines);
    lines
}
