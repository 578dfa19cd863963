use common::AdType;
use common::pricing::{AdTypePricing, PriceBreakdown, PriceSelections};
use serde::{Deserialize, Serialize};

use crate::entity::{ad_type_config, newspaper};

/// One ad type a newspaper accepts, with its effective prices.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdTypeOffer {
    pub ad_type: AdType,
    pub pricing: AdTypePricing,
}

/// An active newspaper customers can book in.
#[derive(Serialize, utoipa::ToSchema)]
pub struct NewspaperResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Daily Mirror")]
    pub name: String,
    pub ad_types: Vec<AdTypeOffer>,
}

impl NewspaperResponse {
    pub fn new(paper: newspaper::Model, configs: &[ad_type_config::Model]) -> Self {
        let ad_types = configs
            .iter()
            .map(|config| AdTypeOffer {
                ad_type: config.ad_type,
                pricing: config.pricing(&paper),
            })
            .collect();
        Self {
            id: paper.id,
            name: paper.name,
            ad_types,
        }
    }
}

/// Request body for a price quote. Nothing is stored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct QuoteRequest {
    #[schema(example = 1)]
    pub newspaper_id: i32,
    #[serde(flatten)]
    pub selections: PriceSelections,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuoteResponse {
    pub newspaper_id: i32,
    pub ad_type: AdType,
    /// Words beyond this limit are cut on submission; 0 means unlimited.
    pub max_words: u32,
    pub breakdown: PriceBreakdown,
}
