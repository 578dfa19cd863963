use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::Json;
use common::ad_status::{available_actions, transition};
use common::ad_text::body_of;
use common::{AdAction, AdStatus};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{advertisement, payment, price_change_request, review_history, status_history};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::tracking::TrackingToken;
use crate::models::shared::{ActionResponse, CustomerError};
use crate::models::tracking::{
    PaymentEntry, PriceChangeEntry, ResubmitRequest, ReviewEntry, StatusEntry, TrackingResponse,
};
use crate::services::lifecycle::{self, Actor, Changes};
use crate::state::AppState;

pub fn payment_body_limit(max_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_size as usize + 64 * 1024)
}

/// Review and status history of one ad, oldest first.
pub(crate) struct History {
    pub reviews: Vec<ReviewEntry>,
    pub statuses: Vec<StatusEntry>,
    pub latest_price_change: Option<PriceChangeEntry>,
    pub payment: Option<PaymentEntry>,
    /// Most recent editor suggestion, if any.
    pub suggestion: Option<String>,
}

/// Review texts are returned without the priority marker, like the ad itself.
pub(crate) async fn load_history<C: ConnectionTrait>(
    conn: &C,
    advertisement_id: i32,
    priority: bool,
) -> Result<History, DbErr> {
    let reviews = review_history::Entity::find()
        .filter(review_history::Column::AdvertisementId.eq(advertisement_id))
        .order_by_asc(review_history::Column::Attempt)
        .all(conn)
        .await?;
    let statuses = status_history::Entity::find()
        .filter(status_history::Column::AdvertisementId.eq(advertisement_id))
        .order_by_asc(status_history::Column::Id)
        .all(conn)
        .await?;
    let latest_price_change = price_change_request::Entity::find()
        .filter(price_change_request::Column::AdvertisementId.eq(advertisement_id))
        .order_by_desc(price_change_request::Column::Id)
        .one(conn)
        .await?;
    let payment = payment::Entity::find()
        .filter(payment::Column::AdvertisementId.eq(advertisement_id))
        .one(conn)
        .await?;

    let suggestion = reviews
        .iter()
        .rev()
        .find_map(|r| r.requested_revision_text.clone());

    Ok(History {
        reviews: reviews
            .into_iter()
            .map(|row| {
                let ad_text = body_of(&row.ad_text, priority).to_string();
                ReviewEntry {
                    ad_text,
                    ..ReviewEntry::from(row)
                }
            })
            .collect(),
        statuses: statuses.into_iter().map(StatusEntry::from).collect(),
        latest_price_change: latest_price_change.map(PriceChangeEntry::from),
        payment: payment.map(PaymentEntry::from),
        suggestion,
    })
}

async fn authorize(
    state: &AppState,
    reference: &str,
    token: Result<TrackingToken, AppError>,
) -> Result<advertisement::Model, AppError> {
    let TrackingToken(token) = token?;
    state.tokens.verify(&state.db, reference, &token).await?;
    lifecycle::find_by_reference(&state.db, reference).await
}

/// Show a tracked advertisement.
#[utoipa::path(
    get,
    path = "/{reference}",
    tag = "Tracking",
    operation_id = "trackAdvertisement",
    summary = "Track an advertisement",
    description = "Returns status, text, review attempts, status history and the latest price change. \
        The tracking token is read from the `token` query parameter or the `X-Tracking-Token` header.",
    params(
        ("reference" = String, Path, description = "16-digit reference number"),
        ("token" = Option<String>, Query, description = "Tracking token"),
    ),
    responses(
        (status = 200, description = "Advertisement", body = TrackingResponse),
        (status = 400, description = "Token missing (MISSING_TOKEN)", body = ErrorBody),
        (status = 403, description = "Token invalid or expired (INVALID_TOKEN, EXPIRED_TOKEN)", body = ErrorBody),
    ),
    security(("tracking_token" = [])),
)]
#[instrument(skip(state, token))]
pub async fn get_tracking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    token: Result<TrackingToken, AppError>,
) -> Result<Json<TrackingResponse>, AppError> {
    let ad = authorize(&state, &reference, token).await?;
    let history = load_history(&state.db, ad.id, ad.priority).await?;

    let attempts = history.reviews.last().map_or(0, |r| r.attempt);
    let suggested_text = history.suggestion.filter(|_| ad.status == AdStatus::Revision);

    Ok(Json(TrackingResponse {
        reference_number: ad.reference_number,
        status: ad.status,
        status_label: ad.status.label().to_string(),
        ad_type: ad.ad_type,
        publish_date: ad.publish_date,
        ad_text: body_of(&ad.ad_text, ad.priority).to_string(),
        priority: ad.priority,
        price: ad.price,
        image_url: ad.image_url,
        image_change_requested: ad.image_change_requested,
        attempts,
        suggested_text,
        review_history: history.reviews,
        status_history: history.statuses,
        latest_price_change: history.latest_price_change,
        payment: history.payment,
        available_actions: available_actions(ad.status, AdAction::CUSTOMER),
    }))
}

/// Resubmit edited text or a new image.
#[utoipa::path(
    post,
    path = "/{reference}/resubmit",
    tag = "Tracking",
    operation_id = "resubmitAdvertisement",
    summary = "Resubmit an advertisement",
    description = "Stores the edited text and/or image and sends the ad back for review. \
        Changed text is repriced. While an image change is requested, only the image is replaced \
        and the ad stays in `UpdateImage`.",
    params(("reference" = String, Path, description = "16-digit reference number")),
    request_body = ResubmitRequest,
    responses(
        (status = 200, description = "Resubmitted", body = ActionResponse),
        (status = 400, description = "Nothing changed (VALIDATION_ERROR) or token missing", body = ActionResponse),
        (status = 403, description = "Token invalid or expired", body = ActionResponse),
        (status = 409, description = "Not allowed in the current status (INVALID_TRANSITION)", body = ActionResponse),
    ),
    security(("tracking_token" = [])),
)]
#[instrument(skip(state, token, payload))]
pub async fn resubmit(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    token: Result<TrackingToken, AppError>,
    AppJson(payload): AppJson<ResubmitRequest>,
) -> Result<Json<ActionResponse>, CustomerError> {
    let ad = authorize(&state, &reference, token).await?;

    let image_url = payload
        .image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());
    let ad_text = payload.ad_text.filter(|text| !text.trim().is_empty());

    if ad.status == AdStatus::UpdateImage {
        let image_url = image_url
            .ok_or_else(|| AppError::Validation("A new image is required".into()))?;
        let updated = lifecycle::replace_image(&state.db, &reference, &image_url).await?;
        return Ok(Json(ActionResponse::done(updated.status)));
    }

    let out = lifecycle::apply_transition(
        &state.db,
        &state.tokens,
        &reference,
        AdAction::Resubmit,
        Actor::Customer,
        Changes {
            ad_text,
            image_url,
            ..Default::default()
        },
    )
    .await?;
    Ok(Json(ActionResponse::done(out.advertisement.status)))
}

/// Accept the editor's suggested text.
#[utoipa::path(
    post,
    path = "/{reference}/confirm",
    tag = "Tracking",
    operation_id = "confirmSuggestion",
    summary = "Accept the suggested revision",
    params(("reference" = String, Path, description = "16-digit reference number")),
    responses(
        (status = 200, description = "Suggestion accepted, ad approved", body = ActionResponse),
        (status = 403, description = "Token invalid or expired", body = ActionResponse),
        (status = 409, description = "No revision pending (INVALID_TRANSITION)", body = ActionResponse),
    ),
    security(("tracking_token" = [])),
)]
#[instrument(skip(state, token))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    token: Result<TrackingToken, AppError>,
) -> Result<Json<ActionResponse>, CustomerError> {
    authorize(&state, &reference, token).await?;
    let out = lifecycle::apply_transition(
        &state.db,
        &state.tokens,
        &reference,
        AdAction::ConfirmSuggestion,
        Actor::Customer,
        Changes::default(),
    )
    .await?;
    Ok(Json(ActionResponse::done(out.advertisement.status)))
}

/// Cancel the booking.
#[utoipa::path(
    post,
    path = "/{reference}/cancel",
    tag = "Tracking",
    operation_id = "cancelAdvertisement",
    summary = "Cancel an advertisement",
    description = "Cancels the booking and revokes every tracking link of the ad.",
    params(("reference" = String, Path, description = "16-digit reference number")),
    responses(
        (status = 200, description = "Cancelled", body = ActionResponse),
        (status = 403, description = "Token invalid or expired", body = ActionResponse),
        (status = 409, description = "Too late to cancel (INVALID_TRANSITION)", body = ActionResponse),
    ),
    security(("tracking_token" = [])),
)]
#[instrument(skip(state, token))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    token: Result<TrackingToken, AppError>,
) -> Result<Json<ActionResponse>, CustomerError> {
    authorize(&state, &reference, token).await?;
    let out = lifecycle::apply_transition(
        &state.db,
        &state.tokens,
        &reference,
        AdAction::Cancel,
        Actor::Customer,
        Changes::default(),
    )
    .await?;
    Ok(Json(ActionResponse::done(out.advertisement.status)))
}

/// Upload the bank slip of an approved ad.
#[utoipa::path(
    post,
    path = "/{reference}/payment",
    tag = "Tracking",
    operation_id = "uploadPaymentSlip",
    summary = "Upload a payment slip",
    description = "Stores the `slip` multipart file and moves the ad to `PaymentPending`. \
        If the slip cannot be stored nothing changes and the call can be retried.",
    params(("reference" = String, Path, description = "16-digit reference number")),
    request_body(content_type = "multipart/form-data", description = "Bank slip in the `slip` field"),
    responses(
        (status = 200, description = "Slip recorded", body = ActionResponse),
        (status = 400, description = "Missing or oversized slip (VALIDATION_ERROR)", body = ActionResponse),
        (status = 403, description = "Token invalid or expired", body = ActionResponse),
        (status = 409, description = "Ad not approved (INVALID_TRANSITION)", body = ActionResponse),
        (status = 502, description = "Slip storage failed (UPSTREAM_ERROR)", body = ActionResponse),
    ),
    security(("tracking_token" = [])),
)]
#[instrument(skip(state, token, multipart))]
pub async fn upload_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    token: Result<TrackingToken, AppError>,
    mut multipart: Multipart,
) -> Result<Json<ActionResponse>, CustomerError> {
    let ad = authorize(&state, &reference, token).await?;
    transition(ad.status, AdAction::ProceedToPayment)?;

    let mut slip: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("slip") {
            let filename = field.file_name().unwrap_or("slip").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read slip: {e}")))?;
            slip = Some((data.to_vec(), filename));
        }
    }
    let (data, filename) =
        slip.ok_or_else(|| AppError::Validation("Missing 'slip' field".into()))?;

    let slip_url = state.images.upload(&data, &filename).await?;

    let out = lifecycle::apply_transition(
        &state.db,
        &state.tokens,
        &reference,
        AdAction::ProceedToPayment,
        Actor::Customer,
        Changes {
            payment_slip_url: Some(slip_url),
            ..Default::default()
        },
    )
    .await?;
    Ok(Json(ActionResponse::done(out.advertisement.status)))
}
