use common::AdType;
use common::pricing::{AdTypePricing, SizePriceMatrix};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price table of one ad type in one newspaper.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ad_type_config")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "newspaper_ad_type")]
    pub newspaper_id: i32,
    #[sea_orm(unique_key = "newspaper_ad_type")]
    pub ad_type: AdType,

    #[sea_orm(belongs_to, from = "newspaper_id", to = "id")]
    pub newspaper: HasOne<super::newspaper::Entity>,

    pub base_price: f64,
    pub count_first_words: i32,
    pub additional_word_price: f64,
    pub tint_price: f64,
    pub priority_price: f64,
    /// Tax percentage.
    pub tax_amount_2: f64,
    /// 0 means unlimited.
    pub max_words: i32,

    /// Serialized [`SizePriceMatrix`].
    #[sea_orm(column_type = "JsonBinary")]
    pub size_price_matrix: serde_json::Value,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Pricing input for this row, with the newspaper's combination surcharges.
    pub fn pricing(&self, newspaper: &super::newspaper::Model) -> AdTypePricing {
        let size_matrix: SizePriceMatrix =
            serde_json::from_value(self.size_price_matrix.clone()).unwrap_or_default();
        AdTypePricing {
            base_price: self.base_price,
            count_first_words: self.count_first_words.max(0) as u32,
            additional_word_price: self.additional_word_price,
            tint_price: self.tint_price,
            priority_price: self.priority_price,
            tax_amount_2: self.tax_amount_2,
            max_words: self.max_words.max(0) as u32,
            english_combo_price: newspaper.english_combo_price,
            tamil_combo_price: newspaper.tamil_combo_price,
            size_matrix,
        }
    }
}
