/// Access Token Codec
///
/// Creates and validates HS256-signed JWT access tokens. Validation is pure
/// computation: no storage lookup, so any instance holding the secret can
/// check any token.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl AccessTokenCodec {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            &settings.jwt_secret,
            settings.issuer.clone(),
            Duration::seconds(settings.access_token_expiry),
        )
    }

    /// Sign a token for `user_id` expiring `ttl` from now
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let claims = Claims::new(user_id, ttl, self.issuer.clone());

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
        tracing::debug!(user_id = %user_id, exp = claims.exp, "access token issued");
        Ok(token)
    }

    pub fn issue_default(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue(user_id, self.ttl)
    }

    /// Validate a token and return its subject
    ///
    /// # Errors
    /// - `TokenExpired` when the signature verifies but `exp` has passed
    /// - `TokenMalformed` for everything else: bad structure, bad signature
    ///   (including another secret), wrong issuer, missing claims
    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "access token rejected");
                    AuthError::TokenMalformed
                }
            }
        })?;

        data.claims.user_id()
    }
}
