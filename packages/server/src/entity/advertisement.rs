use common::{AdStatus, AdType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A booked advertisement. Rows are never deleted; cancellation is a status.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "advertisement")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// 5-digit newspaper serial followed by an 11-digit sequence.
    #[sea_orm(unique)]
    pub reference_number: String,

    pub newspaper_id: i32,
    #[sea_orm(belongs_to, from = "newspaper_id", to = "id")]
    pub newspaper: HasOne<super::newspaper::Entity>,

    pub advertiser_id: i32,
    #[sea_orm(belongs_to, from = "advertiser_id", to = "id")]
    pub advertiser: HasOne<super::advertiser::Entity>,

    pub ad_type: AdType,
    pub classification: String,
    pub subcategory: Option<String>,
    pub publish_date: Date,

    /// Stored form: priority ads keep their leading marker.
    #[sea_orm(column_type = "Text")]
    pub ad_text: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub special_notes: Option<String>,

    pub background_tint: bool,
    pub post_to_web: bool,
    pub priority: bool,

    pub image_url: Option<String>,
    #[sea_orm(default_value = false)]
    pub image_change_requested: bool,

    pub price: f64,

    #[sea_orm(indexed)]
    pub status: AdStatus,

    pub print_url: Option<String>,

    #[sea_orm(has_one)]
    pub casual_detail: HasOne<super::casual_ad_detail::Entity>,
    #[sea_orm(has_one)]
    pub classified_detail: HasOne<super::classified_ad_detail::Entity>,
    #[sea_orm(has_many)]
    pub status_history: HasMany<super::status_history::Entity>,
    #[sea_orm(has_many)]
    pub review_history: HasMany<super::review_history::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
