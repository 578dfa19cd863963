#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of advertisement a customer books.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    /// Text-only, priced per word.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "classified"))]
    Classified,
    /// Classified text with an accompanying photo.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "photo_classified"))]
    PhotoClassified,
    /// Display ad priced by size and color.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "casual"))]
    Casual,
}

impl AdType {
    pub const ALL: &'static [AdType] = &[Self::Classified, Self::PhotoClassified, Self::Casual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::PhotoClassified => "photo_classified",
            Self::Casual => "casual",
        }
    }

    pub fn is_casual(&self) -> bool {
        matches!(self, Self::Casual)
    }

    /// Photo classifieds must carry an uploaded image.
    pub fn requires_image(&self) -> bool {
        matches!(self, Self::PhotoClassified)
    }
}

impl fmt::Display for AdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid ad type '{s}'"))
    }
}

/// Color treatment of a casual (display) ad.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ColorOption {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "full"))]
    Full,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bw"))]
    Bw,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bw1"))]
    Bw1,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bw2"))]
    Bw2,
}

impl ColorOption {
    pub const ALL: &'static [ColorOption] = &[Self::Full, Self::Bw, Self::Bw1, Self::Bw2];

    /// Key used in price matrices and annotation conditions.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Bw => "bw",
            Self::Bw1 => "bw1",
            Self::Bw2 => "bw2",
        }
    }

    /// Label printed on the booking form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "F/C",
            Self::Bw => "BW",
            Self::Bw1 => "BW+1 color",
            Self::Bw2 => "BW+2 colors",
        }
    }
}

impl FromStr for ColorOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorOption::ALL
            .iter()
            .copied()
            .find(|c| c.key() == s)
            .ok_or_else(|| format!("Invalid color option '{s}'"))
    }
}

/// Whether a casual ad takes a full page or a custom column/height box.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum SizeType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "full"))]
    Full,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "custom"))]
    Custom,
}
