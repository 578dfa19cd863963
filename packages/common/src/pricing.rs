//! Price computation for an advertisement booking.
//!
//! Pure functions only: the server uses them for quotes and for the price
//! stored at submission time, so both always agree.

use serde::{Deserialize, Serialize};

use crate::ad_text::{truncate_words, word_count};
use crate::ad_type::{AdType, ColorOption, SizeType};

/// Fee for also publishing the ad on the newspaper website. Not configurable.
pub const POST_TO_WEB_FEE: f64 = 500.0;

/// One price per color option.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ColorPrices {
    pub full: f64,
    pub bw: f64,
    pub bw1: f64,
    pub bw2: f64,
}

impl ColorPrices {
    pub fn get(&self, color: ColorOption) -> f64 {
        match color {
            ColorOption::Full => self.full,
            ColorOption::Bw => self.bw,
            ColorOption::Bw1 => self.bw1,
            ColorOption::Bw2 => self.bw2,
        }
    }
}

/// Casual ad prices: per column-centimetre for custom boxes, flat for a full page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct SizePriceMatrix {
    pub column_cm: ColorPrices,
    pub full_page: ColorPrices,
}

/// Pricing configuration of one ad type in one newspaper.
///
/// Missing fields deserialize to zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct AdTypePricing {
    pub base_price: f64,
    /// Words included in the base price.
    pub count_first_words: u32,
    pub additional_word_price: f64,
    pub tint_price: f64,
    pub priority_price: f64,
    /// Tax percentage applied to the subtotal.
    pub tax_amount_2: f64,
    /// Hard word limit; 0 means unlimited.
    pub max_words: u32,
    /// Surcharge for also running in the English edition (newspaper level).
    pub english_combo_price: f64,
    /// Surcharge for also running in the Tamil edition (newspaper level).
    pub tamil_combo_price: f64,
    pub size_matrix: SizePriceMatrix,
}

/// Geometry of a casual ad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CasualSize {
    pub size_type: SizeType,
    pub columns: u32,
    pub height_cm: f64,
    pub color: ColorOption,
}

/// What the customer picked in the booking form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PriceSelections {
    pub ad_type: AdType,
    /// Ad body without the priority marker.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub background_tint: bool,
    #[serde(default)]
    pub post_to_web: bool,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub publish_in_english: bool,
    #[serde(default)]
    pub publish_in_tamil: bool,
    #[serde(default)]
    pub casual: Option<CasualSize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Base,
    ExtraWords,
    BackgroundTint,
    PostToWeb,
    Priority,
    EnglishCombo,
    TamilCombo,
    Tax,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LineItem {
    pub kind: LineKind,
    pub label: String,
    /// Words, column-centimetres or percent, depending on the line.
    pub quantity: Option<f64>,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PriceBreakdown {
    pub items: Vec<LineItem>,
    pub total: f64,
    /// Body words that will be stored, after applying `max_words`.
    pub billable_words: u32,
}

impl PriceBreakdown {
    pub fn line(&self, kind: LineKind) -> Option<&LineItem> {
        self.items.iter().find(|item| item.kind == kind)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn item(kind: LineKind, label: impl Into<String>, quantity: Option<f64>, amount: f64) -> LineItem {
    LineItem {
        kind,
        label: label.into(),
        quantity,
        amount: round2(amount),
    }
}

fn base_line(config: &AdTypePricing, selections: &PriceSelections) -> LineItem {
    match (selections.ad_type, &selections.casual) {
        (AdType::Casual, Some(size)) if size.size_type == SizeType::Full => item(
            LineKind::Base,
            format!("Full page ({})", size.color.label()),
            None,
            config.size_matrix.full_page.get(size.color),
        ),
        (AdType::Casual, Some(size)) => {
            let column_cm = f64::from(size.columns) * size.height_cm.max(0.0);
            item(
                LineKind::Base,
                format!(
                    "{} col x {} cm ({})",
                    size.columns,
                    size.height_cm,
                    size.color.label()
                ),
                Some(column_cm),
                column_cm * config.size_matrix.column_cm.get(size.color),
            )
        }
        (AdType::Casual, None) => item(LineKind::Base, "Casual ad", None, 0.0),
        _ => item(LineKind::Base, "Base price", None, config.base_price),
    }
}

/// Compute the price breakdown for a booking.
pub fn compute_price(config: &AdTypePricing, selections: &PriceSelections) -> PriceBreakdown {
    let body = truncate_words(&selections.text, config.max_words as usize);
    let words = word_count(&body) as u32;

    let mut items = vec![base_line(config, selections)];

    let extra_words = words.saturating_sub(config.count_first_words);
    if extra_words > 0 {
        items.push(item(
            LineKind::ExtraWords,
            format!("{extra_words} extra words"),
            Some(f64::from(extra_words)),
            f64::from(extra_words) * config.additional_word_price,
        ));
    }

    if selections.background_tint {
        items.push(item(
            LineKind::BackgroundTint,
            "Background tint",
            None,
            config.tint_price,
        ));
    }
    if selections.post_to_web {
        items.push(item(
            LineKind::PostToWeb,
            "Post to website",
            None,
            POST_TO_WEB_FEE,
        ));
    }
    if selections.priority {
        items.push(item(
            LineKind::Priority,
            "Priority",
            None,
            config.priority_price,
        ));
    }
    if selections.publish_in_english {
        items.push(item(
            LineKind::EnglishCombo,
            "English edition",
            None,
            config.english_combo_price,
        ));
    }
    if selections.publish_in_tamil {
        items.push(item(
            LineKind::TamilCombo,
            "Tamil edition",
            None,
            config.tamil_combo_price,
        ));
    }

    if config.tax_amount_2 != 0.0 {
        let subtotal: f64 = items.iter().map(|i| i.amount).sum();
        items.push(item(
            LineKind::Tax,
            format!("Tax ({}%)", config.tax_amount_2),
            Some(config.tax_amount_2),
            subtotal * config.tax_amount_2 / 100.0,
        ));
    }

    let total = items.iter().map(|i| i.amount).sum();
    PriceBreakdown {
        items,
        total,
        billable_words: words,
    }
}
