/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS CSPRNG, hex encoded (64 characters)
/// - persisted with an expiry and a nullable revocation time
/// - reusable until revoked or expired (no rotation on refresh)

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::configuration::Platform;
use crate::db::RefreshTokenRepository;
use crate::domain::{NewRefreshToken, RefreshToken};
use crate::error::{AppError, AuthError, DatabaseError};

const TOKEN_BYTES: usize = 32;

/// Generate a new cryptographically secure refresh token string
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
    ttl: Duration,
    platform: Platform,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>, ttl: Duration, platform: Platform) -> Self {
        Self {
            repository,
            ttl,
            platform,
        }
    }

    /// Mint and persist a refresh token for `user_id`
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, AppError> {
        let record = self
            .repository
            .create_refresh_token(NewRefreshToken {
                token: generate_refresh_token(),
                user_id,
                expires_at: Utc::now() + self.ttl,
            })
            .await?;

        tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "refresh token issued");
        Ok(record)
    }

    /// Look up a refresh token and check it is still usable
    ///
    /// # Errors
    /// Checked in this order:
    /// - `TokenNotFound` if no record matches
    /// - `TokenExpired` if `now >= expires_at`, revoked or not
    /// - `TokenRevoked` if it was revoked
    pub async fn validate(&self, token: &str) -> Result<RefreshToken, AppError> {
        let record = self.find(token).await?;

        if record.is_expired() {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(AuthError::TokenExpired.into());
        }

        if record.is_revoked() {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked.into());
        }

        Ok(record)
    }

    /// Fetch a record regardless of its state
    pub async fn find(&self, token: &str) -> Result<RefreshToken, AppError> {
        match self.repository.get_refresh_token(token).await {
            Ok(record) => Ok(record),
            Err(DatabaseError::NotFound(_)) => {
                tracing::warn!("Refresh token not found");
                Err(AuthError::TokenNotFound.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke a refresh token. Revoking twice is not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.repository.revoke_refresh_token(token, Utc::now()).await?;
        Ok(())
    }

    /// Delete every refresh token. Refused outside the dev platform.
    pub async fn purge_all(&self) -> Result<(), AppError> {
        if !self.platform.is_dev() {
            return Err(AppError::Forbidden(
                "refresh token purge is only allowed on the dev platform".to_string(),
            ));
        }
        self.repository.delete_all_refresh_tokens().await?;
        tracing::info!("All refresh tokens deleted");
        Ok(())
    }
}
