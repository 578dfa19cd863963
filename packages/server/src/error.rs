use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::TransitionError;
use common::draft::SubmissionError;
use layout::LayoutError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::services::image_host::ImageHostError;
use crate::services::tokens::TokenError;

const TOKEN_MESSAGE: &str = "Invalid or expired tracking link";

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `MISSING_TOKEN`,
    /// `INVALID_TOKEN`, `EXPIRED_TOKEN`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `INVALID_CREDENTIALS`, `NOT_FOUND`, `INVALID_TRANSITION`, `CONFLICT`,
    /// `TEMPLATE_NOT_FOUND`, `NO_PUBLISHER`, `UPSTREAM_ERROR`, `REFERENCE_EXHAUSTED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "advertiser.name is required")]
    pub message: String,
    /// Raw failure detail. Only present on admin 5xx responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Customer call without a tracking token.
    TrackingTokenMissing,
    TrackingTokenInvalid,
    TrackingTokenExpired,
    /// Admin call without a bearer token.
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    InvalidTransition(String),
    Conflict(String),
    TemplateNotFound(String),
    NoPublisherMapped(String),
    /// A collaborator (image host, mail relay) failed; the call can be retried.
    Upstream(String),
    /// No free reference number could be claimed.
    ReferenceExhausted(String),
    Internal(String),
}

impl AppError {
    pub(crate) fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::TrackingTokenMissing => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("MISSING_TOKEN", TOKEN_MESSAGE),
            ),
            AppError::TrackingTokenInvalid => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("INVALID_TOKEN", TOKEN_MESSAGE),
            ),
            AppError::TrackingTokenExpired => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("EXPIRED_TOKEN", TOKEN_MESSAGE),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::InvalidTransition(msg) => (
                StatusCode::CONFLICT,
                ErrorBody::new("INVALID_TRANSITION", msg),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new("CONFLICT", msg)),
            AppError::TemplateNotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("TEMPLATE_NOT_FOUND", msg),
            ),
            AppError::NoPublisherMapped(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("NO_PUBLISHER", msg),
            ),
            AppError::Upstream(detail) => {
                tracing::warn!("Upstream failure: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "UPSTREAM_ERROR",
                        message: "An external service failed, please retry".into(),
                        detail: Some(detail),
                    },
                )
            }
            AppError::ReferenceExhausted(detail) => {
                tracing::error!("Reference numbers exhausted: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "REFERENCE_EXHAUSTED",
                        message: "Could not allocate a reference number, please retry".into(),
                        detail: Some(detail),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                        detail: Some(detail),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, mut body) = self.status_and_body();
        body.detail = None;
        (status, Json(body)).into_response()
    }
}

/// Error returned by admin handlers. Unlike [`AppError`], 5xx responses keep
/// the raw failure detail for the operator.
#[derive(Debug)]
pub struct AdminError(pub AppError);

impl From<AppError> for AdminError {
    fn from(err: AppError) -> Self {
        AdminError(err)
    }
}

macro_rules! admin_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for AdminError {
                fn from(err: $source) -> Self {
                    AdminError(AppError::from(err))
                }
            }
        )*
    };
}

admin_error_from!(DbErr, TransitionError, LayoutError, ImageHostError);

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, mut body) = self.0.status_and_body();
        if !status.is_server_error() {
            body.detail = None;
        }
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => AppError::TrackingTokenMissing,
            TokenError::Invalid => AppError::TrackingTokenInvalid,
            TokenError::Expired => AppError::TrackingTokenExpired,
            TokenError::Db(e) => AppError::from(e),
        }
    }
}

impl From<ImageHostError> for AppError {
    fn from(err: ImageHostError) -> Self {
        match err {
            ImageHostError::TooLarge { .. } | ImageHostError::Empty => {
                AppError::Validation(err.to_string())
            }
            ImageHostError::Io(_) => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::NoPublisherMapped | LayoutError::UnknownPublisher(_) => {
                AppError::NoPublisherMapped(err.to_string())
            }
            LayoutError::TemplateNotFound { .. } => AppError::TemplateNotFound(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
