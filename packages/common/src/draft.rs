//! Booking drafts and the submission request they finalize into.
//!
//! The booking wizard edits an [`AdDraft`] through [`AdDraft::apply_patch`]
//! only. [`AdDraft::finalize`] is the validation boundary: it either yields a
//! complete [`SubmissionRequest`] or says which field is missing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ad_text::word_count;
use crate::ad_type::AdType;
use crate::pricing::{CasualSize, PriceSelections};

/// Widest casual ad a page can hold.
pub const MAX_CASUAL_COLUMNS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AdvertiserInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub nic: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClassifiedOptions {
    #[serde(default)]
    pub publish_in_english: bool,
    #[serde(default)]
    pub publish_in_tamil: bool,
    #[serde(default = "default_true")]
    pub publish_in_sinhala: bool,
    /// Sister paper the ad also runs in.
    #[serde(default)]
    pub co_paper: Option<String>,
    #[serde(default)]
    pub internal_color: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ClassifiedOptions {
    fn default() -> Self {
        Self {
            publish_in_english: false,
            publish_in_tamil: false,
            publish_in_sinhala: true,
            co_paper: None,
            internal_color: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CasualOptions {
    pub size: CasualSize,
    #[serde(default)]
    pub artwork_by_office: bool,
    #[serde(default)]
    pub artwork_supplied: bool,
    #[serde(default)]
    pub box_price_ref: Option<String>,
}

/// Type-specific part of a submission, tagged by `ad_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "ad_type", rename_all = "snake_case")]
pub enum AdDetail {
    Classified(ClassifiedOptions),
    PhotoClassified(ClassifiedOptions),
    Casual(CasualOptions),
}

impl AdDetail {
    pub fn ad_type(&self) -> AdType {
        match self {
            Self::Classified(_) => AdType::Classified,
            Self::PhotoClassified(_) => AdType::PhotoClassified,
            Self::Casual(_) => AdType::Casual,
        }
    }

    pub fn classified(&self) -> Option<&ClassifiedOptions> {
        match self {
            Self::Classified(options) | Self::PhotoClassified(options) => Some(options),
            Self::Casual(_) => None,
        }
    }

    pub fn casual(&self) -> Option<&CasualOptions> {
        match self {
            Self::Casual(options) => Some(options),
            _ => None,
        }
    }

    fn empty_for(ad_type: AdType) -> Option<Self> {
        match ad_type {
            AdType::Classified => Some(Self::Classified(ClassifiedOptions::default())),
            AdType::PhotoClassified => Some(Self::PhotoClassified(ClassifiedOptions::default())),
            AdType::Casual => None,
        }
    }
}

/// A complete, validated booking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmissionRequest {
    pub newspaper_id: i32,
    pub advertiser: AdvertiserInfo,
    pub classification: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub publish_date: NaiveDate,
    /// Body text without any priority marker.
    #[serde(default)]
    pub ad_text: String,
    #[serde(default)]
    pub special_notes: Option<String>,
    #[serde(default)]
    pub background_tint: bool,
    #[serde(default)]
    pub post_to_web: bool,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    pub detail: AdDetail,
}

impl SubmissionRequest {
    pub fn ad_type(&self) -> AdType {
        self.detail.ad_type()
    }

    /// Field-level checks run before any pricing or persistence.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.advertiser.name.trim().is_empty() {
            return Err(SubmissionError::Missing("advertiser.name"));
        }
        if !is_plausible_email(&self.advertiser.email) {
            return Err(SubmissionError::Invalid(format!(
                "'{}' is not a valid email address",
                self.advertiser.email
            )));
        }
        if !self.advertiser.phone.chars().any(|c| c.is_ascii_digit()) {
            return Err(SubmissionError::Missing("advertiser.phone"));
        }
        if self.classification.trim().is_empty() {
            return Err(SubmissionError::Missing("classification"));
        }

        match &self.detail {
            AdDetail::Classified(_) | AdDetail::PhotoClassified(_) => {
                if word_count(&self.ad_text) == 0 {
                    return Err(SubmissionError::Missing("ad_text"));
                }
            }
            AdDetail::Casual(options) => {
                let size = &options.size;
                if size.size_type == crate::ad_type::SizeType::Custom
                    && (size.columns == 0 || size.height_cm <= 0.0)
                {
                    return Err(SubmissionError::Invalid(
                        "custom casual ads need at least one column and a positive height"
                            .to_string(),
                    ));
                }
                if size.columns > MAX_CASUAL_COLUMNS {
                    return Err(SubmissionError::Invalid(format!(
                        "a casual ad spans at most {MAX_CASUAL_COLUMNS} columns"
                    )));
                }
            }
        }

        if self.ad_type().requires_image()
            && self.image_url.as_deref().is_none_or(|u| u.trim().is_empty())
        {
            return Err(SubmissionError::Missing("image_url"));
        }
        Ok(())
    }

    pub fn price_selections(&self) -> PriceSelections {
        let classified = self.detail.classified();
        PriceSelections {
            ad_type: self.ad_type(),
            text: self.ad_text.clone(),
            background_tint: self.background_tint,
            post_to_web: self.post_to_web,
            priority: self.priority,
            publish_in_english: classified.is_some_and(|c| c.publish_in_english),
            publish_in_tamil: classified.is_some_and(|c| c.publish_in_tamil),
            casual: self.detail.casual().map(|c| c.size.clone()),
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// One edit coming from a step of the booking wizard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DraftPatch {
    SelectNewspaper { newspaper_id: i32 },
    SelectAdType { ad_type: AdType },
    SetText { text: String },
    SetExtras {
        background_tint: bool,
        post_to_web: bool,
        priority: bool,
    },
    SetClassifiedOptions(ClassifiedOptions),
    SetCasualOptions(CasualOptions),
    SetAdvertiser(AdvertiserInfo),
    SetSchedule {
        classification: String,
        subcategory: Option<String>,
        publish_date: NaiveDate,
    },
    SetImage { image_url: Option<String> },
    SetNotes { special_notes: Option<String> },
}

/// In-progress booking.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdDraft {
    /// Bumped by every applied patch.
    pub version: u32,
    pub newspaper_id: Option<i32>,
    pub ad_type: Option<AdType>,
    pub detail: Option<AdDetail>,
    pub ad_text: String,
    pub background_tint: bool,
    pub post_to_web: bool,
    pub priority: bool,
    pub advertiser: Option<AdvertiserInfo>,
    pub classification: Option<String>,
    pub subcategory: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub special_notes: Option<String>,
}

impl AdDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one patch and return the new version.
    ///
    /// Switching the ad type discards options of the previous type.
    /// Options that do not match the selected type are rejected.
    pub fn apply_patch(&mut self, patch: DraftPatch) -> Result<u32, SubmissionError> {
        match patch {
            DraftPatch::SelectNewspaper { newspaper_id } => self.newspaper_id = Some(newspaper_id),
            DraftPatch::SelectAdType { ad_type } => {
                if self.ad_type != Some(ad_type) {
                    self.ad_type = Some(ad_type);
                    self.detail = AdDetail::empty_for(ad_type);
                }
            }
            DraftPatch::SetText { text } => self.ad_text = text,
            DraftPatch::SetExtras {
                background_tint,
                post_to_web,
                priority,
            } => {
                self.background_tint = background_tint;
                self.post_to_web = post_to_web;
                self.priority = priority;
            }
            DraftPatch::SetClassifiedOptions(options) => {
                self.detail = Some(match self.ad_type {
                    Some(AdType::Classified) => AdDetail::Classified(options),
                    Some(AdType::PhotoClassified) => AdDetail::PhotoClassified(options),
                    _ => {
                        return Err(SubmissionError::Invalid(
                            "classified options need a classified ad type".to_string(),
                        ));
                    }
                });
            }
            DraftPatch::SetCasualOptions(options) => {
                if self.ad_type != Some(AdType::Casual) {
                    return Err(SubmissionError::Invalid(
                        "casual options need the casual ad type".to_string(),
                    ));
                }
                self.detail = Some(AdDetail::Casual(options));
            }
            DraftPatch::SetAdvertiser(advertiser) => self.advertiser = Some(advertiser),
            DraftPatch::SetSchedule {
                classification,
                subcategory,
                publish_date,
            } => {
                self.classification = Some(classification);
                self.subcategory = subcategory;
                self.publish_date = Some(publish_date);
            }
            DraftPatch::SetImage { image_url } => self.image_url = image_url,
            DraftPatch::SetNotes { special_notes } => self.special_notes = special_notes,
        }
        self.version += 1;
        Ok(self.version)
    }

    /// Validate the draft and turn it into a submission request.
    pub fn finalize(&self) -> Result<SubmissionRequest, SubmissionError> {
        let request = SubmissionRequest {
            newspaper_id: self
                .newspaper_id
                .ok_or(SubmissionError::Missing("newspaper_id"))?,
            advertiser: self
                .advertiser
                .clone()
                .ok_or(SubmissionError::Missing("advertiser"))?,
            classification: self
                .classification
                .clone()
                .ok_or(SubmissionError::Missing("classification"))?,
            subcategory: self.subcategory.clone(),
            publish_date: self
                .publish_date
                .ok_or(SubmissionError::Missing("publish_date"))?,
            ad_text: self.ad_text.clone(),
            special_notes: self.special_notes.clone(),
            background_tint: self.background_tint,
            post_to_web: self.post_to_web,
            priority: self.priority,
            image_url: self.image_url.clone(),
            detail: self
                .detail
                .clone()
                .ok_or(SubmissionError::Missing("ad type options"))?,
        };
        request.validate()?;
        Ok(request)
    }
}
