use common::{AdAction, AdStatus, SizeType};
use common::pricing::CasualSize;
use layout::{AdFlags, AdSnapshot};
use sea_orm::*;
use tracing::{instrument, warn};

use crate::entity::{advertisement, advertiser, casual_ad_detail, classified_ad_detail, newspaper};
use crate::error::AppError;
use crate::services::lifecycle::{self, Actor, Changes};
use crate::state::AppState;

/// Everything the layout engine needs about a stored ad.
pub async fn snapshot<C: ConnectionTrait>(
    conn: &C,
    ad: &advertisement::Model,
) -> Result<AdSnapshot, AppError> {
    let paper = newspaper::Entity::find_by_id(ad.newspaper_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(format!("newspaper {} missing", ad.newspaper_id)))?;
    let customer = advertiser::Entity::find_by_id(ad.advertiser_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(format!("advertiser {} missing", ad.advertiser_id)))?;
    let classified = classified_ad_detail::Entity::find()
        .filter(classified_ad_detail::Column::AdvertisementId.eq(ad.id))
        .one(conn)
        .await?;
    let casual = casual_ad_detail::Entity::find()
        .filter(casual_ad_detail::Column::AdvertisementId.eq(ad.id))
        .one(conn)
        .await?;

    let mut flags = AdFlags {
        background_tint: ad.background_tint,
        post_to_web: ad.post_to_web,
        priority: ad.priority,
        ..Default::default()
    };
    if let Some(c) = &classified {
        flags.english = c.publish_in_english;
        flags.tamil = c.publish_in_tamil;
        flags.sinhala = c.publish_in_sinhala;
        flags.co_paper = c.co_paper.as_deref().is_some_and(|p| !p.trim().is_empty());
    }
    if let Some(c) = &casual {
        flags.box_ad = c.size_type == SizeType::Custom;
        flags.full_page = c.size_type == SizeType::Full;
        flags.artwork_by_office = c.artwork_by_office;
        flags.color = Some(c.color_option);
    }

    Ok(AdSnapshot {
        reference_number: ad.reference_number.clone(),
        publisher: paper.publisher,
        edition_key: paper.edition_key,
        ad_type: ad.ad_type,
        classification: ad.classification.clone(),
        subcategory: ad.subcategory.clone(),
        publish_date: ad.publish_date,
        ad_text: ad.ad_text.clone(),
        price: ad.price,
        advertiser_name: customer.name,
        address: customer.address,
        email: customer.email,
        phone: customer.phone,
        nic: customer.nic,
        special_notes: ad.special_notes.clone(),
        flags,
        casual: casual.map(|c| CasualSize {
            size_type: c.size_type,
            columns: u32::try_from(c.columns).unwrap_or(0),
            height_cm: c.height_cm,
            color: c.color_option,
        }),
    })
}

/// Render the print PDF and move the ad to `Print`.
///
/// Nothing changes when rendering fails. Keeping a copy of the PDF on the
/// image host is best effort.
#[instrument(skip(state))]
pub async fn print(
    state: &AppState,
    reference: &str,
    admin: &str,
) -> Result<(Vec<u8>, lifecycle::Transitioned), AppError> {
    let ad = lifecycle::find_by_reference(&state.db, reference).await?;
    if ad.status != AdStatus::PaymentPending {
        return Err(AppError::InvalidTransition(format!(
            "cannot print an advertisement in status {}",
            ad.status
        )));
    }

    let snapshot = snapshot(&state.db, &ad).await?;
    let pdf = state.layout.clone().render_async(snapshot).await?;

    let print_url = match state
        .images
        .upload(&pdf, &format!("{reference}.pdf"))
        .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(reference, error = %e, "Failed to store print PDF");
            None
        }
    };

    let transitioned = lifecycle::apply_transition(
        &state.db,
        &state.tokens,
        reference,
        AdAction::Print,
        Actor::Admin(admin),
        Changes {
            print_url,
            ..Default::default()
        },
    )
    .await?;

    Ok((pdf, transitioned))
}
