//! Persistence side of the advertisement state machine.
//!
//! Every status change goes through [`apply_transition`], which consults the
//! shared transition table and writes the ad, its status history and, for
//! edits, a review snapshot in one transaction.

use chrono::{DateTime, Utc};
use common::ad_status::{initial_status, transition};
use common::ad_text::{body_of, normalize_ad_text, word_count};
use common::draft::{AdDetail, SubmissionRequest};
use common::pricing::{CasualSize, PriceBreakdown, PriceSelections, compute_price};
use common::retry::{RetryError, RetryPolicy};
use common::{AdAction, AdStatus, AdType, ReferenceNumber};
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::entity::{
    ad_type_config, advertisement, advertiser, casual_ad_detail, classified_ad_detail, newspaper,
    payment, price_change_request, review_history, status_history,
};
use crate::error::AppError;
use crate::services::tokens::TokenService;

/// Prices differing by less than this are the same price.
const PRICE_EPSILON: f64 = 0.005;

/// Who caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor<'a> {
    Customer,
    System,
    Admin(&'a str),
}

impl Actor<'_> {
    pub fn name(&self) -> &str {
        match self {
            Actor::Customer => "customer",
            Actor::System => "system",
            Actor::Admin(username) => username,
        }
    }

    fn reviewer(&self) -> Option<String> {
        match self {
            Actor::Admin(username) => Some(ToString::to_string(username)),
            _ => None,
        }
    }
}

/// A price correction recorded together with a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub new_price: f64,
    pub reason: String,
}

/// Data that travels with a transition. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    /// Replacement body text, without the priority marker.
    pub ad_text: Option<String>,
    pub image_url: Option<String>,
    pub image_change_requested: Option<bool>,
    /// Text an admin suggests alongside a revision request.
    pub requested_revision_text: Option<String>,
    pub price: Option<PriceChange>,
    pub payment_slip_url: Option<String>,
    pub print_url: Option<String>,
}

#[derive(Debug)]
pub struct Submitted {
    pub advertisement: advertisement::Model,
    /// Plaintext tracking token; only ever sent to the customer.
    pub token: String,
    pub breakdown: PriceBreakdown,
}

#[derive(Debug)]
pub struct Transitioned {
    pub advertisement: advertisement::Model,
    pub from: AdStatus,
    pub tokens_revoked: u64,
}

/// Newspaper and price table of one ad type.
pub async fn load_pricing<C: ConnectionTrait>(
    conn: &C,
    newspaper_id: i32,
    ad_type: AdType,
    active_only: bool,
) -> Result<(newspaper::Model, ad_type_config::Model), AppError> {
    let paper = newspaper::Entity::find_by_id(newspaper_id)
        .one(conn)
        .await?
        .filter(|n| n.active || !active_only)
        .ok_or_else(|| AppError::NotFound(format!("Newspaper {newspaper_id} not found")))?;

    let config = ad_type_config::Entity::find()
        .filter(ad_type_config::Column::NewspaperId.eq(newspaper_id))
        .filter(ad_type_config::Column::AdType.eq(ad_type))
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "{} does not accept {} advertisements",
                paper.name,
                ad_type.as_str()
            ))
        })?;

    Ok((paper, config))
}

pub async fn find_by_reference<C: ConnectionTrait>(
    conn: &C,
    reference: &str,
) -> Result<advertisement::Model, AppError> {
    advertisement::Entity::find()
        .filter(advertisement::Column::ReferenceNumber.eq(reference))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Advertisement {reference} not found")))
}

struct NewAd<'a> {
    request: &'a SubmissionRequest,
    ad_text: &'a str,
    price: f64,
    prefix: &'a str,
}

enum SubmitError {
    DuplicateReference,
    App(AppError),
}

impl From<DbErr> for SubmitError {
    fn from(err: DbErr) -> Self {
        SubmitError::App(err.into())
    }
}

/// Validate, price and store a new advertisement.
///
/// Advertiser, ad, type detail, first history rows and tracking token are
/// written in one transaction. A lost race for the next reference number
/// rolls back and retries with a fresh one.
#[instrument(skip_all, fields(newspaper_id = request.newspaper_id, ad_type = request.ad_type().as_str()))]
pub async fn submit(
    db: &DatabaseConnection,
    tokens: &TokenService,
    request: &SubmissionRequest,
) -> Result<Submitted, AppError> {
    request.validate()?;

    let (paper, config) = load_pricing(db, request.newspaper_id, request.ad_type(), true).await?;
    let pricing = config.pricing(&paper);
    let breakdown = compute_price(&pricing, &request.price_selections());
    let ad_text = normalize_ad_text(
        &request.ad_text,
        false,
        request.priority,
        pricing.max_words as usize,
    );
    let prefix = ReferenceNumber::prefix(i64::from(paper.serial))
        .map_err(|e| AppError::Internal(format!("newspaper {}: {e}", paper.id)))?;

    let new_ad = NewAd {
        request,
        ad_text: &ad_text,
        price: breakdown.total,
        prefix: &prefix,
    };
    let new_ad = &new_ad;

    let (advertisement, token) =
        with_reference_retry(RetryPolicy::default(), &prefix, move |attempt| {
            insert_submission(db, tokens, new_ad, attempt)
        })
        .await?;

    info!(
        reference = %advertisement.reference_number,
        price = advertisement.price,
        words = word_count(body_of(&advertisement.ad_text, advertisement.priority)),
        "Advertisement submitted"
    );

    Ok(Submitted {
        advertisement,
        token,
        breakdown,
    })
}

/// Run `op` until it stores an ad, retrying while the reference it claimed
/// turns out to be taken. Running out of attempts is `ReferenceExhausted`.
async fn with_reference_retry<T, F, Fut>(
    policy: RetryPolicy,
    prefix: &str,
    op: F,
) -> Result<T, AppError>
where
    F: FnMut(u8) -> Fut,
    Fut: Future<Output = Result<T, SubmitError>>,
{
    match policy
        .run(op, |e| matches!(e, SubmitError::DuplicateReference))
        .await
    {
        Ok(stored) => Ok(stored),
        Err(RetryError::Exhausted { attempts, .. }) => Err(AppError::ReferenceExhausted(format!(
            "{attempts} attempts collided on prefix {prefix}"
        ))),
        Err(RetryError::Aborted(SubmitError::App(e))) => Err(e),
        Err(RetryError::Aborted(SubmitError::DuplicateReference)) => {
            Err(AppError::ReferenceExhausted(prefix.to_string()))
        }
    }
}

async fn insert_submission(
    db: &DatabaseConnection,
    tokens: &TokenService,
    new_ad: &NewAd<'_>,
    attempt: u8,
) -> Result<(advertisement::Model, String), SubmitError> {
    let txn = db.begin().await?;

    let last = advertisement::Entity::find()
        .filter(advertisement::Column::ReferenceNumber.starts_with(new_ad.prefix))
        .order_by_desc(advertisement::Column::ReferenceNumber)
        .one(&txn)
        .await?;
    let reference = ReferenceNumber::next_after(
        new_ad.prefix,
        last.as_ref().map(|ad| ad.reference_number.as_str()),
    )
    .map_err(|e| SubmitError::App(AppError::ReferenceExhausted(e.to_string())))?;
    debug!(attempt, reference = %reference, "Claiming reference number");

    let request = new_ad.request;
    let now = Utc::now();

    let advertiser = advertiser::ActiveModel {
        name: Set(request.advertiser.name.trim().to_string()),
        email: Set(request.advertiser.email.trim().to_string()),
        phone: Set(request.advertiser.phone.trim().to_string()),
        nic: Set(request.advertiser.nic.clone()),
        address: Set(request.advertiser.address.clone()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let status = initial_status();
    let ad = advertisement::ActiveModel {
        reference_number: Set(reference.to_string()),
        newspaper_id: Set(request.newspaper_id),
        advertiser_id: Set(advertiser.id),
        ad_type: Set(request.ad_type()),
        classification: Set(request.classification.trim().to_string()),
        subcategory: Set(request.subcategory.clone()),
        publish_date: Set(request.publish_date),
        ad_text: Set(new_ad.ad_text.to_string()),
        special_notes: Set(request.special_notes.clone()),
        background_tint: Set(request.background_tint),
        post_to_web: Set(request.post_to_web),
        priority: Set(request.priority),
        image_url: Set(request.image_url.clone()),
        image_change_requested: Set(false),
        price: Set(new_ad.price),
        status: Set(status),
        print_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            debug!(attempt, "Reference number taken concurrently");
            SubmitError::DuplicateReference
        }
        _ => SubmitError::from(e),
    })?;

    match &request.detail {
        AdDetail::Classified(options) | AdDetail::PhotoClassified(options) => {
            classified_ad_detail::ActiveModel {
                advertisement_id: Set(ad.id),
                publish_in_english: Set(options.publish_in_english),
                publish_in_tamil: Set(options.publish_in_tamil),
                publish_in_sinhala: Set(options.publish_in_sinhala),
                priority: Set(request.priority),
                co_paper: Set(options.co_paper.clone()),
                internal_color: Set(options.internal_color.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        AdDetail::Casual(options) => {
            let columns = i32::try_from(options.size.columns).map_err(|_| {
                SubmitError::App(AppError::Validation(format!(
                    "{} columns is out of range",
                    options.size.columns
                )))
            })?;
            casual_ad_detail::ActiveModel {
                advertisement_id: Set(ad.id),
                size_type: Set(options.size.size_type),
                columns: Set(columns),
                height_cm: Set(options.size.height_cm),
                color_option: Set(options.size.color),
                artwork_by_office: Set(options.artwork_by_office),
                artwork_supplied: Set(options.artwork_supplied),
                box_price_ref: Set(options.box_price_ref.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    record_status(&txn, ad.id, None, status, AdAction::Submit, Actor::Customer, now).await?;
    record_review(&txn, ad.id, &ad.ad_text, None, None, status, now).await?;

    let token = tokens
        .issue(&txn, reference.as_str(), &request.advertiser.email)
        .await?;

    txn.commit().await?;
    Ok((ad, token))
}

async fn record_status<C: ConnectionTrait>(
    conn: &C,
    advertisement_id: i32,
    from: Option<AdStatus>,
    to: AdStatus,
    action: AdAction,
    actor: Actor<'_>,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    status_history::ActiveModel {
        advertisement_id: Set(advertisement_id),
        from_status: Set(from),
        to_status: Set(to),
        action: Set(action.as_str().to_string()),
        actor: Set(actor.name().to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn record_review<C: ConnectionTrait>(
    conn: &C,
    advertisement_id: i32,
    ad_text: &str,
    requested_revision_text: Option<String>,
    reviewer: Option<String>,
    resulting_status: AdStatus,
    now: DateTime<Utc>,
) -> Result<i32, DbErr> {
    let attempt = latest_attempt(conn, advertisement_id).await? + 1;
    review_history::ActiveModel {
        advertisement_id: Set(advertisement_id),
        attempt: Set(attempt),
        ad_text: Set(ad_text.to_string()),
        requested_revision_text: Set(requested_revision_text),
        reviewer: Set(reviewer),
        resulting_status: Set(resulting_status),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(attempt)
}

/// Highest review attempt of an ad, 0 when none.
pub async fn latest_attempt<C: ConnectionTrait>(
    conn: &C,
    advertisement_id: i32,
) -> Result<i32, DbErr> {
    let latest = review_history::Entity::find()
        .filter(review_history::Column::AdvertisementId.eq(advertisement_id))
        .order_by_desc(review_history::Column::Attempt)
        .one(conn)
        .await?;
    Ok(latest.map_or(0, |row| row.attempt))
}

async fn max_words_for<C: ConnectionTrait>(
    conn: &C,
    ad: &advertisement::Model,
) -> Result<usize, DbErr> {
    let config = ad_type_config::Entity::find()
        .filter(ad_type_config::Column::NewspaperId.eq(ad.newspaper_id))
        .filter(ad_type_config::Column::AdType.eq(ad.ad_type))
        .one(conn)
        .await?;
    Ok(config.map_or(0, |c| Ord::max(c.max_words, 0) as usize))
}

/// Stored form `body` would take on `ad`, ready to compare with `ad.ad_text`.
pub async fn stored_text<C: ConnectionTrait>(
    conn: &C,
    ad: &advertisement::Model,
    body: &str,
) -> Result<String, AppError> {
    let max_words = max_words_for(conn, ad).await?;
    Ok(normalize_ad_text(body, false, ad.priority, max_words))
}

/// Pricing input of a stored ad with `body` as its text.
pub async fn selections_for<C: ConnectionTrait>(
    conn: &C,
    ad: &advertisement::Model,
    body: &str,
) -> Result<PriceSelections, DbErr> {
    let classified = classified_ad_detail::Entity::find()
        .filter(classified_ad_detail::Column::AdvertisementId.eq(ad.id))
        .one(conn)
        .await?;
    let casual = casual_ad_detail::Entity::find()
        .filter(casual_ad_detail::Column::AdvertisementId.eq(ad.id))
        .one(conn)
        .await?;

    Ok(PriceSelections {
        ad_type: ad.ad_type,
        text: body.to_string(),
        background_tint: ad.background_tint,
        post_to_web: ad.post_to_web,
        priority: ad.priority,
        publish_in_english: classified.as_ref().is_some_and(|c| c.publish_in_english),
        publish_in_tamil: classified.as_ref().is_some_and(|c| c.publish_in_tamil),
        casual: casual.map(|c| CasualSize {
            size_type: c.size_type,
            columns: u32::try_from(c.columns).unwrap_or(0),
            height_cm: c.height_cm,
            color: c.color_option,
        }),
    })
}

/// Price of `ad` once its stored text becomes `new_text`.
///
/// Only the word-dependent part moves: earlier corrections by an editor are
/// kept. `None` when the price does not change.
async fn reprice<C: ConnectionTrait>(
    conn: &C,
    ad: &advertisement::Model,
    new_text: &str,
) -> Result<Option<f64>, AppError> {
    let (paper, config) = load_pricing(conn, ad.newspaper_id, ad.ad_type, false).await?;
    let pricing = config.pricing(&paper);
    let before = selections_for(conn, ad, body_of(&ad.ad_text, ad.priority)).await?;
    let after = selections_for(conn, ad, body_of(new_text, ad.priority)).await?;
    let delta = compute_price(&pricing, &after).total - compute_price(&pricing, &before).total;
    if delta.abs() < PRICE_EPSILON {
        return Ok(None);
    }
    Ok(Some(((ad.price + delta) * 100.0).round() / 100.0))
}

async fn latest_suggestion<C: ConnectionTrait>(
    conn: &C,
    advertisement_id: i32,
) -> Result<Option<String>, DbErr> {
    let row = review_history::Entity::find()
        .filter(review_history::Column::AdvertisementId.eq(advertisement_id))
        .filter(review_history::Column::RequestedRevisionText.is_not_null())
        .order_by_desc(review_history::Column::Attempt)
        .one(conn)
        .await?;
    Ok(row.and_then(|r| r.requested_revision_text))
}

/// Apply `action` to the ad with `reference`.
///
/// The ad row is locked for the duration of the transaction. Rejected
/// transitions leave everything unchanged. Reaching a final status revokes
/// the ad's tracking tokens in the same transaction.
#[instrument(skip(db, tokens, changes), fields(action = action.as_str(), actor = actor.name()))]
pub async fn apply_transition(
    db: &DatabaseConnection,
    tokens: &TokenService,
    reference: &str,
    action: AdAction,
    actor: Actor<'_>,
    mut changes: Changes,
) -> Result<Transitioned, AppError> {
    let txn = db.begin().await?;

    let ad = advertisement::Entity::find()
        .filter(advertisement::Column::ReferenceNumber.eq(reference))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Advertisement {reference} not found")))?;

    let from = ad.status;
    let to = transition(from, action)?;
    let now = Utc::now();
    let max_words = max_words_for(&txn, &ad).await?;

    if action == AdAction::ConfirmSuggestion && changes.ad_text.is_none() {
        changes.ad_text = latest_suggestion(&txn, ad.id).await?;
    }

    let new_text = changes
        .ad_text
        .as_deref()
        .map(|body| normalize_ad_text(body, false, ad.priority, max_words));
    let text_changed = new_text.as_ref().is_some_and(|t| *t != ad.ad_text);
    let image_changed = changes
        .image_url
        .as_ref()
        .is_some_and(|url| ad.image_url.as_ref() != Some(url));

    if text_changed && from.is_text_locked() {
        return Err(AppError::Conflict(format!(
            "The text of an advertisement in status {from} can no longer be changed"
        )));
    }

    if action == AdAction::Resubmit && !text_changed && !image_changed {
        return Err(AppError::Validation(
            "Change the text or the image before resubmitting".into(),
        ));
    }

    if text_changed && changes.price.is_none() {
        if let Some(text) = &new_text {
            let reason = match action {
                AdAction::ConfirmSuggestion => "Suggested text accepted",
                _ => "Text changed on resubmission",
            };
            changes.price = reprice(&txn, &ad, text)
                .await?
                .map(|new_price| PriceChange {
                    new_price,
                    reason: reason.into(),
                });
        }
    }

    let mut active: advertisement::ActiveModel = ad.clone().into();
    active.status = Set(to);
    active.updated_at = Set(now);
    if let Some(text) = new_text {
        active.ad_text = Set(text);
    }
    if let Some(url) = changes.image_url.clone() {
        active.image_url = Set(Some(url));
        active.image_change_requested = Set(false);
    }
    if let Some(flag) = changes.image_change_requested {
        active.image_change_requested = Set(flag);
    }
    if let Some(url) = changes.print_url.clone() {
        active.print_url = Set(Some(url));
    }
    let price_change = changes
        .price
        .as_ref()
        .filter(|change| (change.new_price - ad.price).abs() >= PRICE_EPSILON);
    if let Some(change) = price_change {
        price_change_request::ActiveModel {
            advertisement_id: Set(ad.id),
            previous_price: Set(ad.price),
            new_price: Set(change.new_price),
            reason: Set(change.reason.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        active.price = Set(change.new_price);
    }

    let updated = active.update(&txn).await?;

    if let Some(slip_url) = changes.payment_slip_url.clone() {
        payment::ActiveModel {
            advertisement_id: Set(ad.id),
            slip_url: Set(slip_url),
            amount: Set(updated.price),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    record_status(&txn, ad.id, Some(from), to, action, actor, now).await?;
    if action.records_review() {
        record_review(
            &txn,
            ad.id,
            &updated.ad_text,
            changes.requested_revision_text.clone(),
            actor.reviewer(),
            to,
            now,
        )
        .await?;
    }

    let tokens_revoked = if to.is_final() {
        tokens.revoke_all(&txn, reference).await?
    } else {
        0
    };

    txn.commit().await?;

    info!(
        reference,
        from = from.as_str(),
        to = to.as_str(),
        tokens_revoked,
        "Advertisement status changed"
    );

    Ok(Transitioned {
        advertisement: updated,
        from,
        tokens_revoked,
    })
}

/// Replace the image of an ad waiting in `UpdateImage`.
///
/// No status changes; the ad stays in the review queue until an admin decides.
/// The new image opens a review attempt like any other edit.
#[instrument(skip(db))]
pub async fn replace_image(
    db: &DatabaseConnection,
    reference: &str,
    image_url: &str,
) -> Result<advertisement::Model, AppError> {
    let txn = db.begin().await?;

    let ad = advertisement::Entity::find()
        .filter(advertisement::Column::ReferenceNumber.eq(reference))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Advertisement {reference} not found")))?;

    if ad.status != AdStatus::UpdateImage {
        return Err(AppError::InvalidTransition(format!(
            "cannot replace the image of an advertisement in status {}",
            ad.status
        )));
    }
    if ad.image_url.as_deref() == Some(image_url) {
        return Err(AppError::Validation("Upload a different image".into()));
    }

    let now = Utc::now();
    let mut active: advertisement::ActiveModel = ad.into();
    active.image_url = Set(Some(image_url.to_string()));
    active.image_change_requested = Set(false);
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    let attempt = record_review(
        &txn,
        updated.id,
        &updated.ad_text,
        None,
        None,
        updated.status,
        now,
    )
    .await?;

    txn.commit().await?;
    info!(reference, attempt, "Advertisement image replaced");
    Ok(updated)
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;
    use common::draft::{AdvertiserInfo, ClassifiedOptions};
    use common::pricing::SizePriceMatrix;

    use super::*;

    /// Newspaper 1 (serial 7, publisher "wijeya") with a classified price table.
    pub async fn seed_catalog(db: &DatabaseConnection) -> newspaper::Model {
        let paper = newspaper::ActiveModel {
            name: Set("Daily Mirror".into()),
            serial: Set(7),
            publisher: Set(Some("wijeya".into())),
            edition_key: Set("daily_mirror".into()),
            english_combo_price: Set(300.0),
            tamil_combo_price: Set(250.0),
            active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        for ad_type in [AdType::Classified, AdType::Casual] {
            ad_type_config::ActiveModel {
                newspaper_id: Set(paper.id),
                ad_type: Set(ad_type),
                base_price: Set(1000.0),
                count_first_words: Set(20),
                additional_word_price: Set(30.0),
                tint_price: Set(200.0),
                priority_price: Set(400.0),
                tax_amount_2: Set(0.0),
                max_words: Set(65),
                size_price_matrix: Set(serde_json::to_value(SizePriceMatrix::default()).unwrap()),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
        paper
    }

    pub fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    pub fn classified_request(newspaper_id: i32, text: &str, priority: bool) -> SubmissionRequest {
        SubmissionRequest {
            newspaper_id,
            advertiser: AdvertiserInfo {
                name: "Nimal Perera".into(),
                email: "nimal@example.lk".into(),
                phone: "0771234567".into(),
                nic: None,
                address: Some("12 Galle Road, Colombo".into()),
            },
            classification: "Vehicles".into(),
            subcategory: Some("Cars".into()),
            publish_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            ad_text: text.into(),
            special_notes: None,
            background_tint: false,
            post_to_web: false,
            priority,
            image_url: None,
            detail: AdDetail::Classified(ClassifiedOptions::default()),
        }
    }
}
