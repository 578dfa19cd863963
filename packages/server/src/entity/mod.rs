pub mod ad_type_config;
pub mod admin_user;
pub mod advertisement;
pub mod advertiser;
pub mod casual_ad_detail;
pub mod classified_ad_detail;
pub mod newspaper;
pub mod payment;
pub mod price_change_request;
pub mod review_history;
pub mod status_history;
pub mod tracking_token;
