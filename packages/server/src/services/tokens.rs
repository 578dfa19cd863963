use chrono::{Duration, Utc};
use rand::RngCore;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TrackingConfig;
use crate::entity::tracking_token;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("tracking token missing")]
    Missing,
    /// Unknown, revoked, or issued for another reference.
    #[error("tracking token invalid")]
    Invalid,
    #[error("tracking token expired")]
    Expired,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Issues and checks the secret links customers use to manage their ads.
///
/// Only a salted SHA-256 of each token is stored.
#[derive(Clone)]
pub struct TokenService {
    salt: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(salt: impl Into<String>, ttl: Duration) -> Self {
        Self {
            salt: salt.into(),
            ttl,
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(config.token_salt.clone(), Duration::hours(config.token_ttl_hours))
    }

    pub fn hash(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a token for `reference` and return its plaintext.
    pub async fn issue<C: ConnectionTrait>(
        &self,
        conn: &C,
        reference: &str,
        email: &str,
    ) -> Result<String, DbErr> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let now = Utc::now();
        tracking_token::ActiveModel {
            token_hash: Set(self.hash(&token)),
            reference_number: Set(reference.to_string()),
            email: Set(email.to_string()),
            expires_at: Set(now + self.ttl),
            revoked: Set(false),
            last_used_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        debug!(reference, "Issued tracking token");
        Ok(token)
    }

    /// Check `token` against `reference`. Never cached.
    ///
    /// A token of another reference is indistinguishable from an unknown one.
    pub async fn verify(
        &self,
        db: &DatabaseConnection,
        reference: &str,
        token: &str,
    ) -> Result<tracking_token::Model, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let record = tracking_token::Entity::find()
            .filter(tracking_token::Column::TokenHash.eq(self.hash(token)))
            .filter(tracking_token::Column::ReferenceNumber.eq(reference))
            .filter(tracking_token::Column::Revoked.eq(false))
            .one(db)
            .await?
            .ok_or(TokenError::Invalid)?;

        if record.expires_at <= Utc::now() {
            return Err(TokenError::Expired);
        }

        let db = db.clone();
        let id = record.id;
        tokio::spawn(async move {
            let result = tracking_token::Entity::update_many()
                .col_expr(tracking_token::Column::LastUsedAt, Expr::value(Utc::now()))
                .filter(tracking_token::Column::Id.eq(id))
                .exec(&db)
                .await;
            if let Err(e) = result {
                warn!(token_id = id, error = %e, "Failed to record token use");
            }
        });

        Ok(record)
    }

    /// Revoke every token of `reference`. Returns how many were live.
    pub async fn revoke_all<C: ConnectionTrait>(
        &self,
        conn: &C,
        reference: &str,
    ) -> Result<u64, DbErr> {
        let result = tracking_token::Entity::update_many()
            .col_expr(tracking_token::Column::Revoked, Expr::value(true))
            .filter(tracking_token::Column::ReferenceNumber.eq(reference))
            .filter(tracking_token::Column::Revoked.eq(false))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
