//! Declarative cross/tick marks drawn onto templates.
//!
//! Each profile carries a table of rows saying "when this option is selected,
//! draw this mark here". Rows without an edition apply to every newspaper of
//! the publisher; rows with an edition only to that newspaper.

use std::fmt;
use std::str::FromStr;

use common::ColorOption;
use serde::Deserialize;

use crate::publisher::{Point, PublisherProfile};

/// Half the width of a cross mark, in points.
pub const CROSS_HALF_SIZE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkCondition {
    EnglishEdition,
    TamilEdition,
    SinhalaEdition,
    BackgroundTint,
    PostToWeb,
    Priority,
    CoPaper,
    /// Casual ad with a custom column/height box.
    BoxAd,
    FullPage,
    ArtworkByOffice,
    Color(ColorOption),
}

impl MarkCondition {
    pub fn holds(&self, flags: &AdFlags) -> bool {
        match self {
            Self::EnglishEdition => flags.english,
            Self::TamilEdition => flags.tamil,
            Self::SinhalaEdition => flags.sinhala,
            Self::BackgroundTint => flags.background_tint,
            Self::PostToWeb => flags.post_to_web,
            Self::Priority => flags.priority,
            Self::CoPaper => flags.co_paper,
            Self::BoxAd => flags.box_ad,
            Self::FullPage => flags.full_page,
            Self::ArtworkByOffice => flags.artwork_by_office,
            Self::Color(color) => flags.color == Some(*color),
        }
    }
}

impl FromStr for MarkCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(color) = s.strip_prefix("color:") {
            return color.parse().map(Self::Color);
        }
        Ok(match s {
            "english_edition" => Self::EnglishEdition,
            "tamil_edition" => Self::TamilEdition,
            "sinhala_edition" => Self::SinhalaEdition,
            "background_tint" => Self::BackgroundTint,
            "post_to_web" => Self::PostToWeb,
            "priority" => Self::Priority,
            "co_paper" => Self::CoPaper,
            "box_ad" => Self::BoxAd,
            "full_page" => Self::FullPage,
            "artwork_by_office" => Self::ArtworkByOffice,
            other => return Err(format!("unknown mark condition '{other}'")),
        })
    }
}

impl fmt::Display for MarkCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnglishEdition => "english_edition",
            Self::TamilEdition => "tamil_edition",
            Self::SinhalaEdition => "sinhala_edition",
            Self::BackgroundTint => "background_tint",
            Self::PostToWeb => "post_to_web",
            Self::Priority => "priority",
            Self::CoPaper => "co_paper",
            Self::BoxAd => "box_ad",
            Self::FullPage => "full_page",
            Self::ArtworkByOffice => "artwork_by_office",
            Self::Color(color) => return write!(f, "color:{}", color.key()),
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for MarkCondition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    #[default]
    Cross,
    Tick,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotationRow {
    #[serde(default)]
    pub edition: Option<String>,
    pub when: MarkCondition,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub kind: MarkKind,
}

/// Options of one advertisement that marks can depend on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdFlags {
    pub english: bool,
    pub tamil: bool,
    pub sinhala: bool,
    pub background_tint: bool,
    pub post_to_web: bool,
    pub priority: bool,
    pub co_paper: bool,
    pub box_ad: bool,
    pub full_page: bool,
    pub artwork_by_office: bool,
    pub color: Option<ColorOption>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub kind: MarkKind,
    pub at: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AnnotationTable(Vec<AnnotationRow>);

impl AnnotationTable {
    pub fn new(rows: Vec<AnnotationRow>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[AnnotationRow] {
        &self.0
    }

    /// Marks to draw for a newspaper edition and an ad's options, in table order.
    pub fn marks_for(&self, edition: &str, flags: &AdFlags) -> Vec<Mark> {
        self.0
            .iter()
            .filter(|row| row.edition.as_deref().is_none_or(|e| e == edition))
            .filter(|row| row.when.holds(flags))
            .map(|row| Mark {
                kind: row.kind,
                at: Point { x: row.x, y: row.y },
            })
            .collect()
    }
}

/// Where the color-option mark goes for this profile, if anywhere.
pub fn resolve_color_mark(profile: &PublisherProfile, color: ColorOption) -> Option<Point> {
    profile.color_marks.get(color.key()).copied()
}

/// The two diagonal segments of a cross centred on `at`.
pub fn cross_segments(at: Point) -> [(Point, Point); 2] {
    let h = CROSS_HALF_SIZE;
    [
        (
            Point { x: at.x - h, y: at.y - h },
            Point { x: at.x + h, y: at.y + h },
        ),
        (
            Point { x: at.x - h, y: at.y + h },
            Point { x: at.x + h, y: at.y - h },
        ),
    ]
}
