//! TrueType fonts for embedding as composite (Type0, Identity-H) fonts.
//!
//! Only the tables needed to map characters to glyphs and to write the
//! width array are read: `head`, `hhea`, `hmtx` and a format 4 `cmap`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::LayoutError;

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn read_i16(data: &[u8], offset: usize) -> Option<i16> {
    read_u16(data, offset).map(|v| v as i16)
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn truncated(what: &str) -> LayoutError {
    LayoutError::Font(format!("truncated {what}"))
}

#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    name: String,
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    glyphs: HashMap<char, u16>,
    advances: Vec<u16>,
}

impl TrueTypeFont {
    pub fn parse(name: impl Into<String>, data: Vec<u8>) -> Result<Self, LayoutError> {
        let tables = table_directory(&data)?;
        let table = |tag: &str| -> Result<&[u8], LayoutError> {
            tables
                .get(tag)
                .and_then(|&(offset, len)| data.get(offset..offset + len))
                .ok_or_else(|| LayoutError::Font(format!("missing {tag} table")))
        };

        let head = table("head")?;
        let units_per_em = read_u16(head, 18).ok_or_else(|| truncated("head"))?;
        let bbox = [
            read_i16(head, 36).ok_or_else(|| truncated("head"))?,
            read_i16(head, 38).ok_or_else(|| truncated("head"))?,
            read_i16(head, 40).ok_or_else(|| truncated("head"))?,
            read_i16(head, 42).ok_or_else(|| truncated("head"))?,
        ];

        let hhea = table("hhea")?;
        let ascent = read_i16(hhea, 4).ok_or_else(|| truncated("hhea"))?;
        let descent = read_i16(hhea, 6).ok_or_else(|| truncated("hhea"))?;
        let num_h_metrics = read_u16(hhea, 34).ok_or_else(|| truncated("hhea"))?;

        let hmtx = table("hmtx")?;
        let advances = (0..usize::from(num_h_metrics))
            .map_while(|i| read_u16(hmtx, i * 4))
            .collect();

        let glyphs = parse_cmap(table("cmap")?)?;

        if units_per_em == 0 {
            return Err(LayoutError::Font("unitsPerEm is zero".into()));
        }

        Ok(Self {
            name: name.into(),
            data: Arc::new(data),
            units_per_em,
            ascent,
            descent,
            bbox,
            glyphs,
            advances,
        })
    }

    /// PostScript-safe name used as `BaseFont`.
    pub fn base_font(&self) -> String {
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Glyph for a character, `0` (.notdef) when the font lacks it.
    pub fn glyph_id(&self, c: char) -> u16 {
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Advance width in PDF text space units (1/1000 em).
    pub fn pdf_width(&self, glyph: u16) -> i64 {
        let advance = self
            .advances
            .get(usize::from(glyph))
            .or(self.advances.last())
            .copied()
            .unwrap_or(self.units_per_em);
        i64::from(advance) * 1000 / i64::from(self.units_per_em)
    }

    pub fn scale(&self, units: i16) -> i64 {
        i64::from(units) * 1000 / i64::from(self.units_per_em)
    }

    pub fn ascent(&self) -> i64 {
        self.scale(self.ascent)
    }

    pub fn descent(&self) -> i64 {
        self.scale(self.descent)
    }

    pub fn bbox(&self) -> [i64; 4] {
        self.bbox.map(|v| self.scale(v))
    }

    /// Two-byte glyph ids for an Identity-H encoded string.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .flat_map(|c| self.glyph_id(c).to_be_bytes())
            .collect()
    }
}

/// Table tag to (offset, length).
fn table_directory(data: &[u8]) -> Result<HashMap<String, (usize, usize)>, LayoutError> {
    let num_tables = read_u16(data, 4).ok_or_else(|| truncated("offset table"))?;
    let mut tables = HashMap::new();
    for i in 0..usize::from(num_tables) {
        let record = 12 + i * 16;
        let tag = data
            .get(record..record + 4)
            .ok_or_else(|| truncated("table directory"))?;
        let offset = read_u32(data, record + 8).ok_or_else(|| truncated("table directory"))?;
        let length = read_u32(data, record + 12).ok_or_else(|| truncated("table directory"))?;
        tables.insert(
            String::from_utf8_lossy(tag).into_owned(),
            (offset as usize, length as usize),
        );
    }
    Ok(tables)
}

/// Read the Unicode BMP subtable (format 4) of a `cmap` table.
fn parse_cmap(cmap: &[u8]) -> Result<HashMap<char, u16>, LayoutError> {
    let num_subtables = read_u16(cmap, 2).ok_or_else(|| truncated("cmap"))?;
    let mut chosen = None;
    for i in 0..usize::from(num_subtables) {
        let record = 4 + i * 8;
        let platform = read_u16(cmap, record).ok_or_else(|| truncated("cmap"))?;
        let encoding = read_u16(cmap, record + 2).ok_or_else(|| truncated("cmap"))?;
        let offset = read_u32(cmap, record + 4).ok_or_else(|| truncated("cmap"))? as usize;
        let unicode = matches!((platform, encoding), (3, 1) | (0, _));
        if unicode && read_u16(cmap, offset) == Some(4) {
            chosen = Some(offset);
            break;
        }
    }
    let base = chosen.ok_or_else(|| LayoutError::Font("no format 4 unicode cmap".into()))?;
    let sub = cmap.get(base..).ok_or_else(|| truncated("cmap"))?;

    let seg_count = usize::from(read_u16(sub, 6).ok_or_else(|| truncated("cmap"))? / 2);
    let end_codes = 14;
    let start_codes = end_codes + seg_count * 2 + 2;
    let id_deltas = start_codes + seg_count * 2;
    let id_range_offsets = id_deltas + seg_count * 2;

    let mut glyphs = HashMap::new();
    for seg in 0..seg_count {
        let field = |array: usize| read_u16(sub, array + seg * 2).ok_or_else(|| truncated("cmap"));
        let end = field(end_codes)?;
        let start = field(start_codes)?;
        let delta = field(id_deltas)?;
        let range_offset = field(id_range_offsets)?;
        if start > end {
            continue;
        }
        for code in start..=end {
            if code == 0xFFFF {
                break;
            }
            let glyph = if range_offset == 0 {
                code.wrapping_add(delta)
            } else {
                let addr = id_range_offsets
                    + seg * 2
                    + usize::from(range_offset)
                    + usize::from(code - start) * 2;
                match read_u16(sub, addr) {
                    Some(0) | None => 0,
                    Some(g) => g.wrapping_add(delta),
                }
            };
            if glyph == 0 {
                continue;
            }
            if let Some(c) = char::from_u32(u32::from(code)) {
                glyphs.insert(c, glyph);
            }
        }
    }
    Ok(glyphs)
}

/// Lazily loaded fonts from one directory, shared between renders.
pub struct FontCache {
    dir: PathBuf,
    loaded: Mutex<HashMap<String, Arc<TrueTypeFont>>>,
}

impl FontCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// `None` when the file does not exist.
    pub fn get(&self, file: &str) -> Result<Option<Arc<TrueTypeFont>>, LayoutError> {
        let mut loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(font) = loaded.get(file) {
            return Ok(Some(font.clone()));
        }
        let path = self.dir.join(file);
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read(&path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());
        let font = Arc::new(TrueTypeFont::parse(stem, data)?);
        debug!(path = %path.display(), "Loaded font");
        loaded.insert(file.to_string(), font.clone());
        Ok(Some(font))
    }

    pub fn require(&self, file: &str) -> Result<Arc<TrueTypeFont>, LayoutError> {
        self.get(file)?
            .ok_or_else(|| LayoutError::FontMissing(self.dir.join(file)))
    }
}
