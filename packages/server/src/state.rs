use std::sync::Arc;

use layout::LayoutEngine;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::image_host::ImageHost;
use crate::services::mailer::Mailer;
use crate::services::tokens::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageHost>,
    pub layout: Arc<LayoutEngine>,
}

impl AppState {
    /// Customer link for `reference`.
    pub fn tracking_link(&self, reference: &str, token: &str) -> String {
        format!(
            "{}/track/{reference}?token={token}",
            self.config.tracking.public_base_url.trim_end_matches('/')
        )
    }
}
