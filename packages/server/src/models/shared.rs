use axum::{
    Json,
    response::{IntoResponse, Response},
};
use common::AdStatus;
use serde::Serialize;

use crate::error::{AppError, ErrorBody};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    /// Clamp raw query values to `page >= 1` and `1..=100` items per page.
    pub fn clamp(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
        (page.unwrap_or(1).max(1), per_page.unwrap_or(20).clamp(1, 100))
    }

    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Outcome of a customer action on a tracked advertisement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ActionResponse {
    pub ok: bool,
    /// Status after the action; null when the action failed.
    pub status: Option<AdStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ActionResponse {
    pub fn done(status: AdStatus) -> Self {
        Self {
            ok: true,
            status: Some(status),
            error: None,
        }
    }
}

/// Error of a customer action, rendered as a failed [`ActionResponse`].
#[derive(Debug)]
pub struct CustomerError(pub AppError);

impl From<AppError> for CustomerError {
    fn from(err: AppError) -> Self {
        CustomerError(err)
    }
}

macro_rules! customer_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for CustomerError {
                fn from(err: $source) -> Self {
                    CustomerError(AppError::from(err))
                }
            }
        )*
    };
}

customer_error_from!(
    sea_orm::DbErr,
    common::TransitionError,
    crate::services::tokens::TokenError,
    crate::services::image_host::ImageHostError,
);

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let (status, mut body) = self.0.status_and_body();
        body.detail = None;
        let response = ActionResponse {
            ok: false,
            status: None,
            error: Some(body),
        };
        (status, Json(response)).into_response()
    }
}
