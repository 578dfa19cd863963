use std::path::Path;

use chrono::Utc;
use common::pricing::SizePriceMatrix;
use common::{AdType, ReferenceNumber};
use sea_orm::sea_query::{Index, MysqlQueryBuilder, OnConflict, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::entity::{ad_type_config, admin_user, advertisement, newspaper, status_history, tracking_token};
use crate::utils::hash;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid catalog: {0}")]
    Invalid(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Price table of one ad type, as written in the catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct AdTypeEntry {
    pub ad_type: AdType,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub count_first_words: i32,
    #[serde(default)]
    pub additional_word_price: f64,
    #[serde(default)]
    pub tint_price: f64,
    #[serde(default)]
    pub priority_price: f64,
    #[serde(default)]
    pub tax_amount_2: f64,
    #[serde(default)]
    pub max_words: i32,
    #[serde(default)]
    pub size_matrix: SizePriceMatrix,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewspaperEntry {
    pub name: String,
    pub serial: i32,
    #[serde(default)]
    pub publisher: Option<String>,
    pub edition_key: String,
    #[serde(default)]
    pub english_combo_price: f64,
    #[serde(default)]
    pub tamil_combo_price: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, rename = "ad_type")]
    pub ad_types: Vec<AdTypeEntry>,
}

fn default_active() -> bool {
    true
}

/// Newspapers and their ad-type prices.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "newspaper")]
    pub newspapers: Vec<NewspaperEntry>,
}

impl Catalog {
    pub fn from_toml_str(source: &str) -> Result<Self, SeedError> {
        let catalog: Catalog = toml::from_str(source)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), SeedError> {
        for paper in &self.newspapers {
            ReferenceNumber::prefix(i64::from(paper.serial))
                .map_err(|e| SeedError::Invalid(format!("{}: {e}", paper.name)))?;
            if paper.edition_key.trim().is_empty() {
                return Err(SeedError::Invalid(format!(
                    "{}: edition_key is required",
                    paper.name
                )));
            }
            let mut seen = Vec::new();
            for entry in &paper.ad_types {
                if seen.contains(&entry.ad_type) {
                    return Err(SeedError::Invalid(format!(
                        "{}: ad type {} listed twice",
                        paper.name, entry.ad_type
                    )));
                }
                seen.push(entry.ad_type);
            }
        }
        Ok(())
    }
}

/// Insert or update every newspaper and price table of `catalog`.
///
/// Newspapers are matched by serial, price tables by newspaper and ad type.
/// Nothing is deleted.
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &Catalog) -> Result<(), SeedError> {
    for paper in &catalog.newspapers {
        let model = newspaper::ActiveModel {
            name: Set(paper.name.clone()),
            serial: Set(paper.serial),
            publisher: Set(paper.publisher.clone()),
            edition_key: Set(paper.edition_key.clone()),
            english_combo_price: Set(paper.english_combo_price),
            tamil_combo_price: Set(paper.tamil_combo_price),
            active: Set(paper.active),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        newspaper::Entity::insert(model)
            .on_conflict(
                OnConflict::column(newspaper::Column::Serial)
                    .update_columns([
                        newspaper::Column::Name,
                        newspaper::Column::Publisher,
                        newspaper::Column::EditionKey,
                        newspaper::Column::EnglishComboPrice,
                        newspaper::Column::TamilComboPrice,
                        newspaper::Column::Active,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let stored = newspaper::Entity::find()
            .filter(newspaper::Column::Serial.eq(paper.serial))
            .one(db)
            .await?
            .ok_or_else(|| SeedError::Invalid(format!("{} was not stored", paper.name)))?;

        for entry in &paper.ad_types {
            let size_price_matrix = serde_json::to_value(&entry.size_matrix)
                .map_err(|e| SeedError::Invalid(e.to_string()))?;
            let model = ad_type_config::ActiveModel {
                newspaper_id: Set(stored.id),
                ad_type: Set(entry.ad_type),
                base_price: Set(entry.base_price),
                count_first_words: Set(entry.count_first_words),
                additional_word_price: Set(entry.additional_word_price),
                tint_price: Set(entry.tint_price),
                priority_price: Set(entry.priority_price),
                tax_amount_2: Set(entry.tax_amount_2),
                max_words: Set(entry.max_words),
                size_price_matrix: Set(size_price_matrix),
                ..Default::default()
            };
            ad_type_config::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        ad_type_config::Column::NewspaperId,
                        ad_type_config::Column::AdType,
                    ])
                    .update_columns([
                        ad_type_config::Column::BasePrice,
                        ad_type_config::Column::CountFirstWords,
                        ad_type_config::Column::AdditionalWordPrice,
                        ad_type_config::Column::TintPrice,
                        ad_type_config::Column::PriorityPrice,
                        ad_type_config::Column::TaxAmount2,
                        ad_type_config::Column::MaxWords,
                        ad_type_config::Column::SizePriceMatrix,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
        }
    }

    info!(newspapers = catalog.newspapers.len(), "Seeded catalog");
    Ok(())
}

/// Create the configured bootstrap admin unless it already exists.
pub async fn seed_admin(db: &DatabaseConnection, config: &AuthConfig) -> Result<(), SeedError> {
    let (Some(username), Some(password)) = (
        config.bootstrap_admin_username.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(());
    };
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Ok(());
    }

    let exists = admin_user::Entity::find()
        .filter(admin_user::Column::Username.eq(username))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    let hashed = hash::hash_password(password)
        .map_err(|e| SeedError::Invalid(format!("Password hash error: {e}")))?;
    let model = admin_user::ActiveModel {
        username: Set(username.to_string()),
        password: Set(hashed),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = admin_user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(admin_user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(username, "Seeded bootstrap admin"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Ensure composite indexes exist.
///
/// Schema sync only creates single-column and unique indexes, so these are
/// created on startup. Failures are logged and ignored.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        // Review queue: WHERE status = ? [AND newspaper_id = ?] ORDER BY created_at DESC
        (
            "idx_advertisement_status_created",
            Index::create()
                .if_not_exists()
                .name("idx_advertisement_status_created")
                .table(advertisement::Entity)
                .col(advertisement::Column::Status)
                .col(advertisement::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_status_history_ad_created",
            Index::create()
                .if_not_exists()
                .name("idx_status_history_ad_created")
                .table(status_history::Entity)
                .col(status_history::Column::AdvertisementId)
                .col(status_history::Column::CreatedAt)
                .to_owned(),
        ),
        // Revocation: WHERE reference_number = ? AND revoked = false
        (
            "idx_tracking_token_reference_revoked",
            Index::create()
                .if_not_exists()
                .name("idx_tracking_token_reference_revoked")
                .table(tracking_token::Entity)
                .col(tracking_token::Column::ReferenceNumber)
                .col(tracking_token::Column::Revoked)
                .to_owned(),
        ),
    ];

    let backend = db.get_database_backend();
    for (name, index) in indexes {
        let stmt = match backend {
            DbBackend::Postgres => index.to_string(PostgresQueryBuilder),
            DbBackend::Sqlite => index.to_string(SqliteQueryBuilder),
            _ => index.to_string(MysqlQueryBuilder),
        };
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
