//! Admin review decisions.

use common::ad_status::available_actions as table_actions;
use common::{AdAction, AdStatus};

use crate::error::AppError;

/// Map the status an admin asked for onto a table action, checking the
/// guards the panel enforces.
///
/// `text_changed` is true when the admin edited the ad text in this request;
/// `image_change_requested` when the admin flagged the image.
pub fn decide_admin_action(
    current: AdStatus,
    requested: AdStatus,
    text_changed: bool,
    image_change_requested: bool,
) -> Result<AdAction, AppError> {
    let action = match requested {
        AdStatus::Declined => AdAction::Decline,
        AdStatus::Approved => {
            if text_changed {
                return Err(AppError::Validation(
                    "Edited text cannot be approved; request a revision instead".into(),
                ));
            }
            if image_change_requested {
                return Err(AppError::Validation(
                    "An ad with a requested image change cannot be approved".into(),
                ));
            }
            AdAction::Approve
        }
        AdStatus::Revision => {
            if !text_changed {
                return Err(AppError::Validation(
                    "A revision request needs a changed text".into(),
                ));
            }
            AdAction::RequestRevision
        }
        AdStatus::UpdateImage => {
            if !image_change_requested {
                return Err(AppError::Validation(
                    "Flag the image change to request a new image".into(),
                ));
            }
            AdAction::RequestImageChange
        }
        AdStatus::Print => AdAction::Print,
        other => {
            return Err(AppError::Validation(format!(
                "Admins cannot set status {other}"
            )));
        }
    };

    if !table_actions(current, &[action]).contains(&action) {
        return Err(AppError::InvalidTransition(format!(
            "cannot {action} an advertisement in status {current}"
        )));
    }
    Ok(action)
}

/// Admin actions the panel offers for an ad in `status`.
pub fn available_actions(status: AdStatus) -> Vec<AdAction> {
    table_actions(status, AdAction::ADMIN)
}
