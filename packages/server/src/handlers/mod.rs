pub mod admin;
pub mod advertisements;
pub mod auth;
pub mod newspapers;
pub mod tracking;
pub mod uploads;
