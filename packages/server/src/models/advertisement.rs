use common::draft::DraftPatch;
use common::pricing::PriceBreakdown;
use serde::{Deserialize, Serialize};

/// Response to a successful submission.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    #[schema(example = "0000700000000001")]
    pub reference_number: String,
    /// Secret link for tracking and changing the booking. Shown once.
    pub tracking_link: String,
    #[schema(example = 2350.0)]
    pub price: f64,
    pub breakdown: PriceBreakdown,
}

/// Wizard edits replayed in order onto an empty draft.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DraftSubmission {
    pub patches: Vec<DraftPatch>,
}
