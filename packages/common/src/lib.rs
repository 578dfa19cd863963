pub mod ad_status;
pub mod ad_text;
pub mod ad_type;
pub mod draft;
pub mod pricing;
pub mod reference;
pub mod retry;

pub use ad_status::{AdAction, AdStatus, TransitionError};
pub use ad_type::{AdType, ColorOption, SizeType};
pub use reference::ReferenceNumber;
