use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::draft::{AdDraft, SubmissionRequest};
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::advertisement::{DraftSubmission, SubmitResponse};
use crate::services::lifecycle;
use crate::services::mailer::{confirmation_email, send_in_background};
use crate::state::AppState;

/// Submit a booking for review.
#[utoipa::path(
    post,
    path = "/",
    tag = "Booking",
    operation_id = "submitAdvertisement",
    summary = "Submit an advertisement",
    description = "Validates, prices and stores the booking, then emails the tracking link. \
        The request body is discriminated by `detail.ad_type`.",
    request_body = SubmissionRequest,
    responses(
        (status = 201, description = "Advertisement stored", body = SubmitResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Newspaper or ad type not offered (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "No reference number available (REFERENCE_EXHAUSTED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(newspaper_id = payload.newspaper_id))]
pub async fn submit(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    store(&state, &payload).await
}

/// Submit a booking assembled by the wizard.
#[utoipa::path(
    post,
    path = "/drafts",
    tag = "Booking",
    operation_id = "submitDraft",
    summary = "Submit a wizard draft",
    description = "Replays the wizard's patches onto an empty draft, finalizes it and submits the \
        result like `POST /advertisements`. A patch that does not fit the draft, or a draft \
        with missing fields, is rejected before anything is stored.",
    request_body = DraftSubmission,
    responses(
        (status = 201, description = "Advertisement stored", body = SubmitResponse),
        (status = 400, description = "Invalid patch or incomplete draft (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Newspaper or ad type not offered (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "No reference number available (REFERENCE_EXHAUSTED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(patches = payload.patches.len()))]
pub async fn submit_draft(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DraftSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let mut draft = AdDraft::new();
    for patch in payload.patches {
        draft.apply_patch(patch)?;
    }
    let request = draft.finalize()?;
    debug!(version = draft.version, "Draft finalized");
    store(&state, &request).await
}

async fn store(
    state: &AppState,
    payload: &SubmissionRequest,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let submitted = lifecycle::submit(&state.db, &state.tokens, payload).await?;
    let ad = submitted.advertisement;

    let tracking_link = state.tracking_link(&ad.reference_number, &submitted.token);
    let (subject, html) = confirmation_email(&ad.reference_number, &tracking_link, ad.price);
    send_in_background(
        state.mailer.clone(),
        payload.advertiser.email.trim().to_string(),
        subject,
        html,
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            reference_number: ad.reference_number,
            tracking_link,
            price: ad.price,
            breakdown: submitted.breakdown,
        }),
    ))
}
