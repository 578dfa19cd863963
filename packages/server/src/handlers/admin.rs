use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::ad_text::body_of;
use common::draft::AdvertiserInfo;
use common::{AdAction, AdStatus};
use sea_orm::*;
use tracing::{instrument, warn};

use crate::entity::{advertisement, advertiser, casual_ad_detail, classified_ad_detail, newspaper};
use crate::error::{AdminError, AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::handlers::tracking::load_history;
use crate::models::admin::{
    AdminDetailResponse, AdminListItem, AdminListQuery, AdminListResponse, AdminStatusRequest,
    AdminStatusResponse, CasualDetailResponse, ClassifiedDetailResponse, NewspaperSummary,
    validate_status_request,
};
use crate::models::shared::Pagination;
use crate::services::lifecycle::{self, Actor, Changes, PriceChange};
use crate::services::mailer::{send_in_background, status_email};
use crate::services::{print, review};
use crate::state::AppState;

/// Review queue.
#[utoipa::path(
    get,
    path = "/",
    tag = "Admin",
    operation_id = "listAdvertisements",
    summary = "List advertisements",
    description = "Paginated, newest first. Filter by status and newspaper.",
    params(AdminListQuery),
    responses(
        (status = 200, description = "Advertisements", body = AdminListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, query), fields(admin = %admin.username))]
pub async fn list_advertisements(
    admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<AdminListResponse>, AdminError> {
    let (page, per_page) = Pagination::clamp(query.page, query.per_page);

    let mut select = advertisement::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(advertisement::Column::Status.eq(status));
    }
    if let Some(newspaper_id) = query.newspaper_id {
        select = select.filter(advertisement::Column::NewspaperId.eq(newspaper_id));
    }

    let total = select.clone().count(&state.db).await?;
    let ads = select
        .order_by_desc(advertisement::Column::CreatedAt)
        .order_by_desc(advertisement::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = ads
        .into_iter()
        .map(|ad| AdminListItem {
            reference_number: ad.reference_number,
            newspaper_id: ad.newspaper_id,
            ad_type: ad.ad_type,
            classification: ad.classification,
            publish_date: ad.publish_date,
            status: ad.status,
            price: ad.price,
            created_at: ad.created_at,
            updated_at: ad.updated_at,
        })
        .collect();

    Ok(Json(AdminListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// Full advertisement with history and the actions available now.
#[utoipa::path(
    get,
    path = "/{reference}",
    tag = "Admin",
    operation_id = "getAdvertisement",
    summary = "Get an advertisement",
    params(("reference" = String, Path, description = "16-digit reference number")),
    responses(
        (status = 200, description = "Advertisement", body = AdminDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn get_advertisement(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<AdminDetailResponse>, AdminError> {
    let ad = lifecycle::find_by_reference(&state.db, &reference).await?;

    let paper = newspaper::Entity::find_by_id(ad.newspaper_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("newspaper {} missing", ad.newspaper_id)))?;
    let customer = advertiser::Entity::find_by_id(ad.advertiser_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("advertiser {} missing", ad.advertiser_id)))?;
    let classified = classified_ad_detail::Entity::find()
        .filter(classified_ad_detail::Column::AdvertisementId.eq(ad.id))
        .one(&state.db)
        .await?;
    let casual = casual_ad_detail::Entity::find()
        .filter(casual_ad_detail::Column::AdvertisementId.eq(ad.id))
        .one(&state.db)
        .await?;
    let history = load_history(&state.db, ad.id, ad.priority).await?;

    Ok(Json(AdminDetailResponse {
        reference_number: ad.reference_number,
        newspaper: NewspaperSummary {
            id: paper.id,
            name: paper.name,
            publisher: paper.publisher,
        },
        advertiser: AdvertiserInfo {
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            nic: customer.nic,
            address: customer.address,
        },
        ad_type: ad.ad_type,
        classification: ad.classification,
        subcategory: ad.subcategory,
        publish_date: ad.publish_date,
        ad_text: body_of(&ad.ad_text, ad.priority).to_string(),
        special_notes: ad.special_notes,
        background_tint: ad.background_tint,
        post_to_web: ad.post_to_web,
        priority: ad.priority,
        image_url: ad.image_url,
        image_change_requested: ad.image_change_requested,
        price: ad.price,
        status: ad.status,
        print_url: ad.print_url,
        classified: classified.map(|c| ClassifiedDetailResponse {
            publish_in_english: c.publish_in_english,
            publish_in_tamil: c.publish_in_tamil,
            publish_in_sinhala: c.publish_in_sinhala,
            co_paper: c.co_paper,
            internal_color: c.internal_color,
        }),
        casual: casual.map(|c| CasualDetailResponse {
            size_type: c.size_type,
            columns: c.columns,
            height_cm: c.height_cm,
            color_option: c.color_option,
            artwork_by_office: c.artwork_by_office,
            artwork_supplied: c.artwork_supplied,
            box_price_ref: c.box_price_ref,
        }),
        review_history: history.reviews,
        status_history: history.statuses,
        latest_price_change: history.latest_price_change,
        payment: history.payment,
        available_actions: review::available_actions(ad.status),
        created_at: ad.created_at,
        updated_at: ad.updated_at,
    }))
}

/// Statuses after which the customer has something to do.
fn needs_customer(status: AdStatus) -> bool {
    matches!(
        status,
        AdStatus::Revision | AdStatus::UpdateImage | AdStatus::Approved
    )
}

/// Apply an admin decision.
#[utoipa::path(
    post,
    path = "/{reference}/status",
    tag = "Admin",
    operation_id = "setAdvertisementStatus",
    summary = "Decide on an advertisement",
    description = "Approve, decline, request a revision (with suggested text) or request a new image. \
        Edited text cannot be approved, a revision needs changed text, and an image request needs \
        `image_change_requested`. `Print` renders the PDF first, like the print endpoint. \
        The customer is notified by email.",
    params(("reference" = String, Path, description = "16-digit reference number")),
    request_body = AdminStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = AdminStatusResponse),
        (status = 400, description = "Guard failed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not allowed in the current status (INVALID_TRANSITION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin = %admin.username, status = %payload.status))]
pub async fn set_status(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(reference): Path<String>,
    AppJson(payload): AppJson<AdminStatusRequest>,
) -> Result<Json<AdminStatusResponse>, AdminError> {
    validate_status_request(&payload)?;
    let ad = lifecycle::find_by_reference(&state.db, &reference).await?;

    let edited = payload.ad_text.filter(|text| !text.trim().is_empty());
    let text_changed = match &edited {
        Some(body) => lifecycle::stored_text(&state.db, &ad, body).await? != ad.ad_text,
        None => false,
    };
    let action = review::decide_admin_action(
        ad.status,
        payload.status,
        text_changed,
        payload.image_change_requested,
    )?;

    let transitioned = if action == AdAction::Print {
        let (_pdf, transitioned) = print::print(&state, &reference, &admin.username).await?;
        transitioned
    } else {
        let mut changes = Changes {
            price: payload.new_price.map(|new_price| PriceChange {
                new_price,
                reason: payload.reason.unwrap_or_default().trim().to_string(),
            }),
            ..Default::default()
        };
        match action {
            AdAction::RequestRevision => changes.requested_revision_text = edited,
            AdAction::RequestImageChange => changes.image_change_requested = Some(true),
            _ => {}
        }
        lifecycle::apply_transition(
            &state.db,
            &state.tokens,
            &reference,
            action,
            Actor::Admin(&admin.username),
            changes,
        )
        .await?
    };

    let ad = transitioned.advertisement;
    notify_customer(&state, &ad).await;

    Ok(Json(AdminStatusResponse {
        reference_number: ad.reference_number,
        from: transitioned.from,
        status: ad.status,
        price: ad.price,
        available_actions: review::available_actions(ad.status),
    }))
}

/// Email the advertiser about a decision. Failures are only logged.
async fn notify_customer(state: &AppState, ad: &advertisement::Model) {
    let customer = match advertiser::Entity::find_by_id(ad.advertiser_id)
        .one(&state.db)
        .await
    {
        Ok(Some(customer)) => customer,
        Ok(None) => return,
        Err(e) => {
            warn!(reference = %ad.reference_number, error = %e, "Failed to load advertiser for notification");
            return;
        }
    };

    let link = if needs_customer(ad.status) {
        match state
            .tokens
            .issue(&state.db, &ad.reference_number, &customer.email)
            .await
        {
            Ok(token) => Some(state.tracking_link(&ad.reference_number, &token)),
            Err(e) => {
                warn!(reference = %ad.reference_number, error = %e, "Failed to issue tracking token");
                None
            }
        }
    } else {
        None
    };

    let (subject, html) = status_email(&ad.reference_number, ad.status, link.as_deref());
    send_in_background(state.mailer.clone(), customer.email, subject, html);
}

/// Render the print PDF and mark the ad as sent to print.
#[utoipa::path(
    post,
    path = "/{reference}/print",
    tag = "Admin",
    operation_id = "printAdvertisement",
    summary = "Print an advertisement",
    description = "Renders the publisher's booking form for a paid ad and moves it to `Print`. \
        The status only changes when rendering succeeded.",
    params(("reference" = String, Path, description = "16-digit reference number")),
    responses(
        (status = 200, description = "Print PDF", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No template or publisher (TEMPLATE_NOT_FOUND, NO_PUBLISHER)", body = ErrorBody),
        (status = 409, description = "Ad not awaiting print (INVALID_TRANSITION)", body = ErrorBody),
        (status = 500, description = "Rendering failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn print_advertisement(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    let (pdf, transitioned) = print::print(&state, &reference, &admin.username).await?;
    notify_customer(&state, &transitioned.advertisement).await;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{reference}.pdf\""),
        )
        .body(Body::from(pdf))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}
