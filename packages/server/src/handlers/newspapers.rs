use axum::{Json, extract::State};
use common::AdType;
use common::pricing::compute_price;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ad_type_config, newspaper};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::newspaper::{NewspaperResponse, QuoteRequest, QuoteResponse};
use crate::services::lifecycle::load_pricing;
use crate::state::AppState;

/// List newspapers open for booking.
#[utoipa::path(
    get,
    path = "/",
    tag = "Booking",
    operation_id = "listNewspapers",
    summary = "List newspapers",
    description = "Active newspapers with the ad types they accept and the prices of each.",
    responses(
        (status = 200, description = "Newspapers", body = Vec<NewspaperResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_newspapers(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewspaperResponse>>, AppError> {
    let papers = newspaper::Entity::find()
        .filter(newspaper::Column::Active.eq(true))
        .order_by_asc(newspaper::Column::Name)
        .find_with_related(ad_type_config::Entity)
        .all(&state.db)
        .await?;

    let data = papers
        .into_iter()
        .map(|(paper, configs)| NewspaperResponse::new(paper, &configs))
        .collect();
    Ok(Json(data))
}

/// Price a booking without storing it.
#[utoipa::path(
    post,
    path = "/",
    tag = "Booking",
    operation_id = "quotePrice",
    summary = "Quote a price",
    description = "Computes the line-item breakdown the booking would be charged. \
        Uses the same rules as submission, so the quote and the stored price agree.",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price breakdown", body = QuoteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Newspaper or ad type not offered (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(newspaper_id = payload.newspaper_id))]
pub async fn quote(
    State(state): State<AppState>,
    AppJson(payload): AppJson<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let selections = payload.selections;
    if selections.ad_type == AdType::Casual && selections.casual.is_none() {
        return Err(AppError::Validation(
            "Casual ads need a size to be priced".into(),
        ));
    }

    let (paper, config) =
        load_pricing(&state.db, payload.newspaper_id, selections.ad_type, true).await?;
    let pricing = config.pricing(&paper);
    let breakdown = compute_price(&pricing, &selections);

    Ok(Json(QuoteResponse {
        newspaper_id: paper.id,
        ad_type: selections.ad_type,
        max_words: pricing.max_words,
        breakdown,
    }))
}
