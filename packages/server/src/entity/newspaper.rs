use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "newspaper")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    /// Prefix source of reference numbers (0..=99999).
    #[sea_orm(unique)]
    pub serial: i32,

    /// Print-template publisher; `None` means the paper cannot be printed yet.
    pub publisher: Option<String>,

    /// Key matched by edition-specific annotation rows.
    pub edition_key: String,

    pub english_combo_price: f64,
    pub tamil_combo_price: f64,

    #[sea_orm(default_value = true)]
    pub active: bool,

    #[sea_orm(has_many)]
    pub ad_type_configs: HasMany<super::ad_type_config::Entity>,

    #[sea_orm(has_many)]
    pub advertisements: HasMany<super::advertisement::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
