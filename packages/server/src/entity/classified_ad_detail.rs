use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classified_ad_detail")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub advertisement_id: i32,
    #[sea_orm(belongs_to, from = "advertisement_id", to = "id")]
    pub advertisement: HasOne<super::advertisement::Entity>,

    pub publish_in_english: bool,
    pub publish_in_tamil: bool,
    pub publish_in_sinhala: bool,
    pub priority: bool,
    pub co_paper: Option<String>,
    pub internal_color: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
