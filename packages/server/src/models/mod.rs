pub mod admin;
pub mod advertisement;
pub mod auth;
pub mod newspaper;
pub mod shared;
pub mod tracking;
