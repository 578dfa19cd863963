use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "advertiser")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(indexed)]
    pub email: String,
    pub phone: String,
    /// National identity card number.
    pub nic: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    #[sea_orm(has_many)]
    pub advertisements: HasMany<super::advertisement::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
