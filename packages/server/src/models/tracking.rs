use chrono::{DateTime, NaiveDate, Utc};
use common::{AdAction, AdStatus, AdType};
use serde::{Deserialize, Serialize};

use crate::entity::{payment, price_change_request, review_history, status_history};

/// One review attempt as shown to customers and admins.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewEntry {
    #[schema(example = 1)]
    pub attempt: i32,
    pub ad_text: String,
    /// Text an editor proposed with this attempt.
    pub requested_revision_text: Option<String>,
    pub reviewer: Option<String>,
    pub resulting_status: AdStatus,
    pub created_at: DateTime<Utc>,
}

impl From<review_history::Model> for ReviewEntry {
    fn from(row: review_history::Model) -> Self {
        Self {
            attempt: row.attempt,
            ad_text: row.ad_text,
            requested_revision_text: row.requested_revision_text,
            reviewer: row.reviewer,
            resulting_status: row.resulting_status,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusEntry {
    pub from_status: Option<AdStatus>,
    pub to_status: AdStatus,
    #[schema(example = "approve")]
    pub action: String,
    #[schema(example = "customer")]
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl From<status_history::Model> for StatusEntry {
    fn from(row: status_history::Model) -> Self {
        Self {
            from_status: row.from_status,
            to_status: row.to_status,
            action: row.action,
            actor: row.actor,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PriceChangeEntry {
    pub previous_price: f64,
    pub new_price: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<price_change_request::Model> for PriceChangeEntry {
    fn from(row: price_change_request::Model) -> Self {
        Self {
            previous_price: row.previous_price,
            new_price: row.new_price,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentEntry {
    pub slip_url: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentEntry {
    fn from(row: payment::Model) -> Self {
        Self {
            slip_url: row.slip_url,
            amount: row.amount,
            created_at: row.created_at,
        }
    }
}

/// Everything a customer sees behind the tracking link.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TrackingResponse {
    #[schema(example = "0000700000000001")]
    pub reference_number: String,
    pub status: AdStatus,
    /// Display label, e.g. "Sent to Print".
    #[schema(example = "Pending")]
    pub status_label: String,
    pub ad_type: AdType,
    pub publish_date: NaiveDate,
    /// Body text without the priority marker; send it back as is to keep it.
    pub ad_text: String,
    pub priority: bool,
    pub price: f64,
    pub image_url: Option<String>,
    pub image_change_requested: bool,
    /// Number of review attempts so far.
    #[schema(example = 1)]
    pub attempts: i32,
    /// Text suggested by the editor while the ad waits for the customer.
    pub suggested_text: Option<String>,
    pub review_history: Vec<ReviewEntry>,
    pub status_history: Vec<StatusEntry>,
    pub latest_price_change: Option<PriceChangeEntry>,
    pub payment: Option<PaymentEntry>,
    /// Customer actions valid in the current status.
    pub available_actions: Vec<AdAction>,
}

/// Request body for a customer resubmission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResubmitRequest {
    /// New body text, without the priority marker.
    pub ad_text: Option<String>,
    pub image_url: Option<String>,
}
