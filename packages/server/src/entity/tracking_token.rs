use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hashed customer tracking token. The plaintext is only ever emailed.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_token")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Hex SHA-256 of salt followed by the plaintext token.
    #[sea_orm(unique)]
    pub token_hash: String,

    #[sea_orm(indexed)]
    pub reference_number: String,
    pub email: String,

    pub expires_at: DateTimeUtc,
    #[sea_orm(default_value = false)]
    pub revoked: bool,
    pub last_used_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
