use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::error::AppError;

pub const TRACKING_TOKEN_HEADER: &str = "X-Tracking-Token";

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Raw customer tracking token from `?token=` or the `X-Tracking-Token` header.
///
/// Only presence is checked here; handlers verify it against the reference.
pub struct TrackingToken(pub String);

impl<S> FromRequestParts<S> for TrackingToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let from_query = Query::<TokenQuery>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Query(q)| q.token);
        let token = from_query.or_else(|| {
            parts
                .headers
                .get(TRACKING_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });

        match token {
            Some(token) if !token.trim().is_empty() => Ok(TrackingToken(token.trim().to_string())),
            _ => Err(AppError::TrackingTokenMissing),
        }
    }
}
