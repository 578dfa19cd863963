use common::{ColorOption, SizeType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "casual_ad_detail")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub advertisement_id: i32,
    #[sea_orm(belongs_to, from = "advertisement_id", to = "id")]
    pub advertisement: HasOne<super::advertisement::Entity>,

    pub size_type: SizeType,
    pub columns: i32,
    pub height_cm: f64,
    pub color_option: ColorOption,
    pub artwork_by_office: bool,
    pub artwork_supplied: bool,
    pub box_price_ref: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
