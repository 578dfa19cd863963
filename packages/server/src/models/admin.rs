use chrono::{DateTime, NaiveDate, Utc};
use common::draft::AdvertiserInfo;
use common::{AdAction, AdStatus, AdType, ColorOption, SizeType};
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use super::tracking::{PaymentEntry, PriceChangeEntry, ReviewEntry, StatusEntry};
use crate::error::AppError;

/// Query parameters for the review queue.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AdminListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Filter by status.
    pub status: Option<AdStatus>,
    /// Filter by newspaper ID.
    #[param(example = 1)]
    pub newspaper_id: Option<i32>,
}

/// Advertisement summary for the review queue.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminListItem {
    #[schema(example = "0000700000000001")]
    pub reference_number: String,
    pub newspaper_id: i32,
    pub ad_type: AdType,
    pub classification: String,
    pub publish_date: NaiveDate,
    pub status: AdStatus,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminListResponse {
    pub data: Vec<AdminListItem>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewspaperSummary {
    pub id: i32,
    pub name: String,
    pub publisher: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClassifiedDetailResponse {
    pub publish_in_english: bool,
    pub publish_in_tamil: bool,
    pub publish_in_sinhala: bool,
    pub co_paper: Option<String>,
    pub internal_color: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CasualDetailResponse {
    pub size_type: SizeType,
    pub columns: i32,
    pub height_cm: f64,
    pub color_option: ColorOption,
    pub artwork_by_office: bool,
    pub artwork_supplied: bool,
    pub box_price_ref: Option<String>,
}

/// Full advertisement for the review screen.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminDetailResponse {
    pub reference_number: String,
    pub newspaper: NewspaperSummary,
    pub advertiser: AdvertiserInfo,
    pub ad_type: AdType,
    pub classification: String,
    pub subcategory: Option<String>,
    pub publish_date: NaiveDate,
    /// Body text without the priority marker.
    pub ad_text: String,
    pub special_notes: Option<String>,
    pub background_tint: bool,
    pub post_to_web: bool,
    pub priority: bool,
    pub image_url: Option<String>,
    pub image_change_requested: bool,
    pub price: f64,
    pub status: AdStatus,
    pub print_url: Option<String>,
    pub classified: Option<ClassifiedDetailResponse>,
    pub casual: Option<CasualDetailResponse>,
    pub review_history: Vec<ReviewEntry>,
    pub status_history: Vec<StatusEntry>,
    pub latest_price_change: Option<PriceChangeEntry>,
    pub payment: Option<PaymentEntry>,
    /// Admin actions valid in the current status.
    pub available_actions: Vec<AdAction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for an admin decision.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AdminStatusRequest {
    /// Target status: `Approved`, `Declined`, `Revision`, `UpdateImage` or `Print`.
    pub status: AdStatus,
    /// Edited body text. Required for `Revision`, where it becomes the suggestion.
    pub ad_text: Option<String>,
    #[serde(default)]
    pub image_change_requested: bool,
    /// Corrected price; recorded as a price change with `reason`.
    pub new_price: Option<f64>,
    pub reason: Option<String>,
}

pub fn validate_status_request(payload: &AdminStatusRequest) -> Result<(), AppError> {
    if let Some(price) = payload.new_price {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::Validation("new_price must be a non-negative amount".into()));
        }
        if payload.reason.as_deref().is_none_or(|r| r.trim().is_empty()) {
            return Err(AppError::Validation("A price change needs a reason".into()));
        }
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminStatusResponse {
    pub reference_number: String,
    pub from: AdStatus,
    pub status: AdStatus,
    pub price: f64,
    pub available_actions: Vec<AdAction>,
}
