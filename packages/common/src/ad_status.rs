#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of an advertisement through review, payment and print.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum AdStatus {
    /// Submitted, waiting for the first review.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Pending"))]
    Pending,
    /// Admin suggested a text revision; waiting for the customer.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Revision"))]
    Revision,
    /// Customer sent an edited version back.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Resubmitted"))]
    Resubmitted,
    /// Admin asked for a different image.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "UpdateImage"))]
    UpdateImage,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Approved"))]
    Approved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Declined"))]
    Declined,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Cancelled"))]
    Cancelled,
    /// Payment slip uploaded, waiting for the admin to print.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PaymentPending"))]
    PaymentPending,
    /// Rendered and handed over to the publisher ("Sent to Print").
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Print"))]
    Print,
}

impl AdStatus {
    /// All possible status values.
    pub const ALL: &'static [AdStatus] = &[
        Self::Pending,
        Self::Revision,
        Self::Resubmitted,
        Self::UpdateImage,
        Self::Approved,
        Self::Declined,
        Self::Cancelled,
        Self::PaymentPending,
        Self::Print,
    ];

    /// Ad text is read-only in these states.
    pub fn is_text_locked(&self) -> bool {
        matches!(
            self,
            Self::Print | Self::Approved | Self::Declined | Self::Cancelled | Self::PaymentPending
        )
    }

    /// No further action of any kind is possible.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Print | Self::Declined | Self::Cancelled)
    }

    /// Returns the string representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Revision => "Revision",
            Self::Resubmitted => "Resubmitted",
            Self::UpdateImage => "UpdateImage",
            Self::Approved => "Approved",
            Self::Declined => "Declined",
            Self::Cancelled => "Cancelled",
            Self::PaymentPending => "PaymentPending",
            Self::Print => "Print",
        }
    }

    /// Human-readable label shown to customers and admins.
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpdateImage => "Update Image",
            Self::PaymentPending => "Payment Pending",
            Self::Print => "Sent to Print",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for AdStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            AdStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for AdStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}

/// Something a customer, an admin or the system does to an advertisement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdAction {
    Submit,
    Decline,
    RequestRevision,
    RequestImageChange,
    Approve,
    Resubmit,
    ConfirmSuggestion,
    ProceedToPayment,
    Print,
    Cancel,
}

impl AdAction {
    pub const ALL: &'static [AdAction] = &[
        Self::Submit,
        Self::Decline,
        Self::RequestRevision,
        Self::RequestImageChange,
        Self::Approve,
        Self::Resubmit,
        Self::ConfirmSuggestion,
        Self::ProceedToPayment,
        Self::Print,
        Self::Cancel,
    ];

    /// Actions performed from the admin panel.
    pub const ADMIN: &'static [AdAction] = &[
        Self::Decline,
        Self::RequestRevision,
        Self::RequestImageChange,
        Self::Approve,
        Self::Print,
    ];

    /// Actions performed through the tracking link.
    pub const CUSTOMER: &'static [AdAction] = &[
        Self::Resubmit,
        Self::ConfirmSuggestion,
        Self::ProceedToPayment,
        Self::Cancel,
    ];

    /// Actions that carry an edit and therefore open a new review attempt.
    pub fn records_review(&self) -> bool {
        matches!(
            self,
            Self::Submit
                | Self::RequestRevision
                | Self::RequestImageChange
                | Self::Resubmit
                | Self::ConfirmSuggestion
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Decline => "decline",
            Self::RequestRevision => "request_revision",
            Self::RequestImageChange => "request_image_change",
            Self::Approve => "approve",
            Self::Resubmit => "resubmit",
            Self::ConfirmSuggestion => "confirm_suggestion",
            Self::ProceedToPayment => "proceed_to_payment",
            Self::Print => "print",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for AdAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} an advertisement in status {from}")]
pub struct TransitionError {
    pub from: AdStatus,
    pub action: AdAction,
}

/// The single transition table shared by the customer and admin paths.
///
/// `Submit` has no source state; use [`initial_status`] for it.
pub fn transition(from: AdStatus, action: AdAction) -> Result<AdStatus, TransitionError> {
    use AdAction as A;
    use AdStatus as S;

    let to = match (from, action) {
        (S::Pending | S::Resubmitted | S::UpdateImage, A::Decline) => S::Declined,
        (S::Pending | S::Resubmitted | S::UpdateImage, A::RequestRevision) => S::Revision,
        (S::Pending | S::Resubmitted | S::UpdateImage, A::RequestImageChange) => S::UpdateImage,
        (S::Pending | S::Resubmitted | S::UpdateImage, A::Approve) => S::Approved,
        (S::Revision | S::Pending | S::Resubmitted, A::Resubmit) => S::Resubmitted,
        (S::Revision, A::ConfirmSuggestion) => S::Approved,
        (S::Approved, A::ProceedToPayment) => S::PaymentPending,
        (S::PaymentPending, A::Print) => S::Print,
        (S::Pending | S::Revision | S::Resubmitted | S::Approved, A::Cancel) => S::Cancelled,
        _ => return Err(TransitionError { from, action }),
    };
    Ok(to)
}

/// Status of a freshly submitted advertisement.
pub fn initial_status() -> AdStatus {
    AdStatus::Pending
}

/// Actions from `candidates` that the table accepts in `status`.
pub fn available_actions(status: AdStatus, candidates: &[AdAction]) -> Vec<AdAction> {
    candidates
        .iter()
        .copied()
        .filter(|action| transition(status, *action).is_ok())
        .collect()
}
