use common::AdStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one review attempt.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "advertisement_attempt")]
    pub advertisement_id: i32,
    #[sea_orm(unique_key = "advertisement_attempt")]
    pub attempt: i32,
    #[sea_orm(belongs_to, from = "advertisement_id", to = "id")]
    pub advertisement: HasOne<super::advertisement::Entity>,

    #[sea_orm(column_type = "Text")]
    pub ad_text: String,
    /// Text an admin proposed when requesting a revision.
    #[sea_orm(column_type = "Text", nullable)]
    pub requested_revision_text: Option<String>,
    pub reviewer: Option<String>,
    pub resulting_status: AdStatus,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
