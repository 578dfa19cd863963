//! Drawing onto the first page of a template.
//!
//! Operations are collected first and written in one go: the new content
//! stream is appended to the page and the fonts it uses are registered in
//! the page resources.

use std::collections::BTreeSet;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::annotations::{CROSS_HALF_SIZE, Mark, MarkKind, cross_segments};
use crate::error::LayoutError;
use crate::font::TrueTypeFont;
use crate::publisher::Point;
use crate::script::{Script, split_runs};

const LATIN_RESOURCE: &str = "FAdLatin";
const SINHALA_RESOURCE: &str = "FAdSinhala";
const MARK_LINE_WIDTH: f32 = 0.8;
const MAX_PARENT_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum DrawOp {
    Text { at: Point, size: f32, text: String },
    Mark(Mark),
}

/// Fonts available to one render.
#[derive(Clone, Default)]
pub struct Fonts {
    /// Embedded Latin font; Helvetica when `None`.
    pub latin: Option<Arc<TrueTypeFont>>,
    pub sinhala: Option<Arc<TrueTypeFont>>,
}

#[derive(Debug, Default)]
pub struct PageCanvas {
    ops: Vec<DrawOp>,
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, at: Point, size: f32, text: impl Into<String>) {
        let text = text.into();
        if !text.trim().is_empty() {
            self.ops.push(DrawOp::Text { at, size, text });
        }
    }

    pub fn mark(&mut self, mark: Mark) {
        self.ops.push(DrawOp::Mark(mark));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Mark(_) => None,
        })
    }

    /// Whether any queued text contains Sinhala characters.
    pub fn needs_sinhala(&self) -> bool {
        self.texts()
            .any(|text| split_runs(text).iter().any(|(s, _)| *s == Script::Sinhala))
    }

    fn chars_of(&self, script: Script) -> BTreeSet<char> {
        self.texts()
            .flat_map(split_runs)
            .filter(|(s, _)| *s == script)
            .flat_map(|(_, run)| run.chars())
            .collect()
    }

    /// Write the queued operations onto the first page of `doc`.
    pub fn apply(self, doc: &mut Document, fonts: &Fonts) -> Result<(), LayoutError> {
        let page_id = doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| LayoutError::Template("template has no pages".into()))?;

        let sinhala = if self.needs_sinhala() {
            fonts.sinhala.clone()
        } else {
            None
        };

        let latin_id = match &fonts.latin {
            Some(font) => embed_type0(doc, font, &self.chars_of(Script::Latin))?,
            None => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }),
        };
        let sinhala_id = match &sinhala {
            Some(font) => Some(embed_type0(doc, font, &self.chars_of(Script::Sinhala))?),
            None => None,
        };

        let content = Content {
            operations: self.operations(fonts.latin.as_deref(), sinhala.as_deref()),
        };
        let encoded = content.encode()?;

        let mut resources = inherited_resources(doc, page_id)?;
        let mut font_dict = match resources.get(b"Font") {
            Ok(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        font_dict.set(LATIN_RESOURCE, Object::Reference(latin_id));
        if let Some(id) = sinhala_id {
            font_dict.set(SINHALA_RESOURCE, Object::Reference(id));
        }
        resources.set("Font", Object::Dictionary(font_dict));

        let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut overlay_bytes = b"Q\n".to_vec();
        overlay_bytes.extend(encoded);
        let overlay = doc.add_object(Stream::new(Dictionary::new(), overlay_bytes));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(overlay));

        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
        Ok(())
    }

    fn operations(
        &self,
        latin: Option<&TrueTypeFont>,
        sinhala: Option<&TrueTypeFont>,
    ) -> Vec<Operation> {
        let mut ops = vec![
            op("q", vec![]),
            op("g", vec![Object::Integer(0)]),
            op("G", vec![Object::Integer(0)]),
        ];

        for draw in &self.ops {
            match draw {
                DrawOp::Text { at, size, text } => {
                    ops.push(op("BT", vec![]));
                    ops.push(op("Td", vec![real(at.x), real(at.y)]));
                    for (script, run) in split_runs(text) {
                        let (resource, bytes, format) = match (script, sinhala) {
                            (Script::Sinhala, Some(font)) => {
                                (SINHALA_RESOURCE, font.encode(run), StringFormat::Hexadecimal)
                            }
                            _ => match latin {
                                Some(font) => {
                                    (LATIN_RESOURCE, font.encode(run), StringFormat::Hexadecimal)
                                }
                                None => (LATIN_RESOURCE, win_ansi(run), StringFormat::Literal),
                            },
                        };
                        ops.push(op("Tf", vec![Object::Name(resource.into()), real(*size)]));
                        ops.push(op("Tj", vec![Object::String(bytes, format)]));
                    }
                    ops.push(op("ET", vec![]));
                }
                DrawOp::Mark(mark) => {
                    ops.push(op("w", vec![real(MARK_LINE_WIDTH)]));
                    match mark.kind {
                        MarkKind::Cross => {
                            for (from, to) in cross_segments(mark.at) {
                                ops.push(op("m", vec![real(from.x), real(from.y)]));
                                ops.push(op("l", vec![real(to.x), real(to.y)]));
                            }
                        }
                        MarkKind::Tick => {
                            let h = CROSS_HALF_SIZE;
                            let Point { x, y } = mark.at;
                            ops.push(op("m", vec![real(x - h), real(y)]));
                            ops.push(op("l", vec![real(x - h / 3.0), real(y - h)]));
                            ops.push(op("l", vec![real(x + h), real(y + h)]));
                        }
                    }
                    ops.push(op("S", vec![]));
                }
            }
        }
        ops.push(op("Q", vec![]));
        ops
    }
}

/// Latin-1 subset of WinAnsiEncoding; anything else prints as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if !(0x80..0xA0).contains(&b) => b,
            _ => b'?',
        })
        .collect()
}

fn inherited_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, LayoutError> {
    let mut current = page_id;
    for _ in 0..MAX_PARENT_DEPTH {
        let node = doc.get_dictionary(current)?;
        match node.get(b"Resources") {
            Ok(Object::Reference(id)) => return Ok(doc.get_dictionary(*id)?.clone()),
            Ok(Object::Dictionary(dict)) => return Ok(dict.clone()),
            _ => {}
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    Ok(Dictionary::new())
}

/// Embed a TrueType font as Type0 / CIDFontType2 with Identity-H encoding.
fn embed_type0(
    doc: &mut Document,
    font: &TrueTypeFont,
    used: &BTreeSet<char>,
) -> Result<ObjectId, LayoutError> {
    let base_font = font.base_font();

    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data().len() as i64 },
        font.data().to_vec(),
    ));

    let [x_min, y_min, x_max, y_max] = font.bbox();
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(base_font.clone().into_bytes()),
        "Flags" => 32,
        "FontBBox" => vec![x_min.into(), y_min.into(), x_max.into(), y_max.into()],
        "ItalicAngle" => 0,
        "Ascent" => font.ascent(),
        "Descent" => font.descent(),
        "CapHeight" => font.ascent() * 7 / 10,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let glyphs: BTreeSet<u16> = used.iter().map(|c| font.glyph_id(*c)).collect();
    let mut widths = Vec::with_capacity(glyphs.len() * 2);
    for glyph in &glyphs {
        widths.push(Object::Integer(i64::from(*glyph)));
        widths.push(Object::Array(vec![Object::Integer(font.pdf_width(*glyph))]));
    }

    let cid_font = dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(base_font.clone().into_bytes()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    };
    let cid_id = doc.add_object(cid_font);

    let to_unicode = doc.add_object(Stream::new(
        Dictionary::new(),
        to_unicode_cmap(font, used).into_bytes(),
    ));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(base_font.into_bytes()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_id)],
        "ToUnicode" => to_unicode,
    }))
}

fn to_unicode_cmap(font: &TrueTypeFont, used: &BTreeSet<char>) -> String {
    let mappings: Vec<(u16, char)> = used
        .iter()
        .filter(|c| font.has_glyph(**c))
        .map(|c| (font.glyph_id(*c), *c))
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // bfchar sections hold at most 100 entries each
    for chunk in mappings.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (glyph, c) in chunk {
            cmap.push_str(&format!("<{:04X}> <{:04X}>\n", glyph, u32::from(*c)));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}
