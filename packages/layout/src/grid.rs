//! Placement of classified text on the publisher grid.

use crate::publisher::{ChunkingMode, Point, PublisherProfile};

/// Most units ever printed for one ad, whatever the grid size.
pub const MAX_PRINT_WORDS: usize = 70;

/// Tokens per unit in sentence mode.
pub const SENTENCE_CHUNK_WORDS: usize = 5;

/// Break text into units according to the publisher's chunking mode.
pub fn chunk(text: &str, mode: ChunkingMode) -> Vec<String> {
    let words = text.split_whitespace();
    match mode {
        ChunkingMode::Word => words.map(str::to_string).collect(),
        ChunkingMode::Sentence => words
            .collect::<Vec<_>>()
            .chunks(SENTENCE_CHUNK_WORDS)
            .map(|chunk| chunk.join(" "))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub text: String,
    pub at: Point,
}

/// Assign units to grid cells row by row.
///
/// Units beyond the grid capacity or [`MAX_PRINT_WORDS`] are dropped.
pub fn place(units: Vec<String>, profile: &PublisherProfile) -> Vec<Placement> {
    let limit = profile.capacity().min(MAX_PRINT_WORDS);
    let columns = profile.columns.len();

    units
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, text)| Placement {
            text,
            at: Point {
                x: profile.columns[i % columns],
                y: profile.rows[i / columns],
            },
        })
        .collect()
}

/// Chunk and place in one step.
pub fn layout_text(text: &str, profile: &PublisherProfile) -> Vec<Placement> {
    place(chunk(text, profile.chunking), profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationTable;
    use crate::publisher::FieldSlots;

    fn profile(columns: usize, rows: usize, chunking: ChunkingMode) -> PublisherProfile {
        PublisherProfile {
            columns: (0..columns).map(|c| 10.0 + c as f32 * 50.0).collect(),
            rows: (0..rows).map(|r| 700.0 - r as f32 * 20.0).collect(),
            chunking,
            font_size: 9.0,
            latin_font: None,
            sinhala_font: "sinhala.ttf".into(),
            fields: FieldSlots::default(),
            color_marks: Default::default(),
            annotations: AnnotationTable::default(),
        }
    }

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn sentence_mode_groups_five_tokens() {
        let units = chunk(&words(12), ChunkingMode::Sentence);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0], "w1 w2 w3 w4 w5");
        assert_eq!(units[2], "w11 w12");
    }

    #[test]
    fn placement_is_row_major() {
        let p = profile(3, 2, ChunkingMode::Word);
        let placed = layout_text("a b c d", &p);
        assert_eq!(placed[2].at, Point { x: 110.0, y: 700.0 });
        assert_eq!(placed[3].at, Point { x: 10.0, y: 680.0 });
    }

    #[test]
    fn overflow_beyond_capacity_is_dropped() {
        let p = profile(4, 3, ChunkingMode::Word);
        let placed = layout_text(&words(80), &p);
        assert_eq!(placed.len(), 12);
        assert_eq!(placed.last().unwrap().text, "w12");
    }

    #[test]
    fn large_grids_stop_at_max_print_words() {
        let p = profile(10, 10, ChunkingMode::Word);
        assert_eq!(layout_text(&words(80), &p).len(), MAX_PRINT_WORDS);
    }
}
