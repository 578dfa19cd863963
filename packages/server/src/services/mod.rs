pub mod image_host;
pub mod lifecycle;
pub mod mailer;
pub mod print;
pub mod review;
pub mod tokens;
