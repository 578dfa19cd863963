//! Per-publisher coordinate tables.
//!
//! Profiles are static configuration read from a TOML file. Every
//! coordinate is in PDF points with the origin at the bottom-left corner of
//! the template page.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::annotations::AnnotationTable;
use crate::error::LayoutError;

pub const DEFAULT_FONT_SIZE: f32 = 9.0;
pub const DEFAULT_SINHALA_FONT: &str = "NotoSansSinhala-Regular.ttf";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// How ad text is broken into placeable units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingMode {
    /// One whitespace token per cell.
    #[default]
    Word,
    /// Runs of five tokens per cell.
    Sentence,
}

/// One box per character, e.g. the phone number boxes on a form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DigitSlots {
    pub y: f32,
    pub xs: Vec<f32>,
}

/// Multi-line text area used for casual ads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextBlock {
    pub x: f32,
    pub y: f32,
    pub line_height: f32,
    #[serde(default)]
    pub width_chars: Option<usize>,
    #[serde(default)]
    pub max_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldSlots {
    pub reference: Option<Point>,
    pub publish_date: Option<Point>,
    pub classification: Option<Point>,
    pub price: Option<Point>,
    pub name: Option<Point>,
    pub address: Option<Point>,
    pub email: Option<Point>,
    pub notes: Option<Point>,
    pub phone_digits: Option<DigitSlots>,
    pub nic_digits: Option<DigitSlots>,
    pub casual_text: Option<TextBlock>,
    pub casual_dimensions: Option<Point>,
    pub casual_color_label: Option<Point>,
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_sinhala_font() -> String {
    DEFAULT_SINHALA_FONT.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublisherProfile {
    /// X coordinate of each grid column, left to right.
    pub columns: Vec<f32>,
    /// Y coordinate of each grid row, top to bottom.
    pub rows: Vec<f32>,
    #[serde(default)]
    pub chunking: ChunkingMode,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// TrueType file under the fonts directory; Helvetica when unset or absent.
    #[serde(default)]
    pub latin_font: Option<String>,
    #[serde(default = "default_sinhala_font")]
    pub sinhala_font: String,
    #[serde(default)]
    pub fields: FieldSlots,
    /// Color option key (`full`, `bw`, `bw1`, `bw2`) to mark position.
    #[serde(default)]
    pub color_marks: BTreeMap<String, Point>,
    #[serde(default)]
    pub annotations: AnnotationTable,
}

impl PublisherProfile {
    /// Number of grid cells.
    pub fn capacity(&self) -> usize {
        self.columns.len() * self.rows.len()
    }
}

/// Result of looking up a publisher.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Exact(&'a PublisherProfile),
    /// The publisher has no table; the default profile is used instead.
    Fallback(&'a PublisherProfile),
}

impl<'a> Resolved<'a> {
    pub fn profile(&self) -> &'a PublisherProfile {
        match self {
            Resolved::Exact(p) | Resolved::Fallback(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Fallback(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherRegistry {
    default: PublisherProfile,
    #[serde(default)]
    publishers: HashMap<String, PublisherProfile>,
}

impl PublisherRegistry {
    pub fn new(default: PublisherProfile) -> Self {
        Self {
            default,
            publishers: HashMap::new(),
        }
    }

    pub fn with_publisher(mut self, name: impl Into<String>, profile: PublisherProfile) -> Self {
        self.publishers.insert(name.into(), profile);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, LayoutError> {
        let registry: Self =
            toml::from_str(source).map_err(|e| LayoutError::Config(e.to_string()))?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let all = std::iter::once(("default", &self.default))
            .chain(self.publishers.iter().map(|(k, v)| (k.as_str(), v)));
        for (name, profile) in all {
            if profile.columns.is_empty() || profile.rows.is_empty() {
                return Err(LayoutError::Config(format!(
                    "profile '{name}' needs at least one column and one row"
                )));
            }
            if profile.font_size <= 0.0 {
                return Err(LayoutError::Config(format!(
                    "profile '{name}' has a non-positive font size"
                )));
            }
        }
        Ok(())
    }

    pub fn publisher_names(&self) -> impl Iterator<Item = &str> {
        self.publishers.keys().map(String::as_str)
    }

    /// Profile for `publisher`, falling back to the default one.
    pub fn resolve(&self, publisher: &str) -> Resolved<'_> {
        match self.publishers.get(publisher) {
            Some(profile) => Resolved::Exact(profile),
            None => {
                warn!(publisher, "No layout profile for publisher, using default");
                Resolved::Fallback(&self.default)
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but unknown publishers are an error.
    pub fn resolve_strict(&self, publisher: &str) -> Result<&PublisherProfile, LayoutError> {
        self.publishers
            .get(publisher)
            .ok_or_else(|| LayoutError::UnknownPublisher(publisher.to_string()))
    }
}
