/// Authentication Orchestrator
///
/// Composes the password hasher, the access token codec and the refresh
/// token store into the flows the HTTP layer calls. Callers only ever see
/// `Unauthorized` for a failed token check; the precise cause is logged here.

use std::sync::{Arc, OnceLock};

use actix_web::http::header::HeaderMap;
use chrono::Duration;
use uuid::Uuid;

use crate::auth::credentials::{api_key, bearer_token};
use crate::auth::jwt::AccessTokenCodec;
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::RefreshTokenStore;
use crate::configuration::{AuthSettings, Platform};
use crate::db::{Store, UserRepository};
use crate::domain::User;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::validators::{is_valid_email, validate_password_policy};

/// Verified against when the email is unknown so both login failures pay
/// for one bcrypt comparison.
const DUMMY_PASSWORD: &str = "chirpy-dummy-password";

/// Everything a successful login hands back.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokenStore,
    access_tokens: AccessTokenCodec,
    hasher: PasswordHasher,
    polka_key: String,
    dummy_hash: Arc<OnceLock<String>>,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: RefreshTokenStore,
        access_tokens: AccessTokenCodec,
        hasher: PasswordHasher,
        polka_key: impl Into<String>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            access_tokens,
            hasher,
            polka_key: polka_key.into(),
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn from_settings<S>(settings: &AuthSettings, platform: Platform, store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        let refresh_tokens = RefreshTokenStore::new(
            store.clone(),
            Duration::seconds(settings.refresh_token_expiry),
            platform,
        );
        Self::new(
            store,
            refresh_tokens,
            AccessTokenCodec::from_settings(settings),
            PasswordHasher::new(settings.password_cost),
            settings.polka_key.clone(),
        )
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenStore {
        &self.refresh_tokens
    }

    /// Create an account
    ///
    /// # Errors
    /// - `Validation` for a malformed email or a password outside policy
    /// - `Conflict` if the email is already registered
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = is_valid_email(email)?;
        validate_password_policy(password)?;

        let hashed = self.hash_password(password).await?;
        let user = self.users.create_user(&email, &hashed).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and mint an access token plus a refresh token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = is_valid_email(email)?;

        let user = match self.users.get_user_by_email(&email).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                let dummy = self.dummy_hash().await?;
                self.verify_password(password, &dummy).await?;
                tracing::warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e.into()),
        };

        if !self.verify_password(password, &user.hashed_password).await? {
            tracing::warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self.access_tokens.issue_default(user.id)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?.token;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Resolve the bearer access token to its subject. No storage access.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Uuid, AppError> {
        let token = bearer_token(headers).map_err(|e| deny("authorize", e.into()))?;
        self.access_tokens
            .validate(token)
            .map_err(|e| deny("authorize", e.into()))
    }

    /// Exchange a valid bearer refresh token for a new access token.
    /// The refresh token itself stays valid.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let token = bearer_token(headers).map_err(|e| deny("refresh", e.into()))?;
        let record = self
            .refresh_tokens
            .validate(token)
            .await
            .map_err(|e| deny("refresh", e))?;

        self.access_tokens.issue_default(record.user_id)
    }

    /// Revoke the bearer refresh token. Already revoked tokens are accepted.
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = bearer_token(headers).map_err(|e| deny("revoke", e.into()))?;
        let record = self
            .refresh_tokens
            .find(token)
            .await
            .map_err(|e| deny("revoke", e))?;

        self.refresh_tokens.revoke(token).await?;
        tracing::info!(user_id = %record.user_id, "Refresh token revoked");
        Ok(())
    }

    pub fn ensure_owner(&self, subject: Uuid, owner: Uuid) -> Result<(), AppError> {
        if subject != owner {
            tracing::warn!(subject = %subject, owner = %owner, "Ownership check failed");
            return Err(AppError::Forbidden(format!(
                "user {} does not own this resource",
                subject
            )));
        }
        Ok(())
    }

    /// Replace the subject's email and password
    pub async fn update_credentials(
        &self,
        subject: Uuid,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let email = is_valid_email(email)?;
        validate_password_policy(password)?;

        let hashed = self.hash_password(password).await?;
        let user = self
            .users
            .update_user_credentials(subject, &email, &hashed)
            .await?;

        tracing::info!(user_id = %user.id, "User credentials updated");
        Ok(user)
    }

    /// Check the `ApiKey` credential sent by the payment provider
    pub fn authorize_webhook(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let key = api_key(headers).map_err(|e| deny("webhook", e.into()))?;
        if !constant_time_eq(key.as_bytes(), self.polka_key.as_bytes()) {
            return Err(deny("webhook", AuthError::InvalidApiKey.into()));
        }
        Ok(())
    }

    pub async fn upgrade_user(&self, user_id: Uuid) -> Result<User, AppError> {
        match self.users.upgrade_user(user_id).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User upgraded");
                Ok(user)
            }
            Err(DatabaseError::NotFound(_)) => {
                Err(AppError::NotFound(format!("user {}", user_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let hasher = self.hasher;
        let (password, hash) = (password.to_string(), hash.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?
    }

    /// Hashed once at the configured cost, on first use.
    async fn dummy_hash(&self) -> Result<String, AppError> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.clone());
        }
        let hash = self.hash_password(DUMMY_PASSWORD).await?;
        Ok(self.dummy_hash.get_or_init(|| hash).clone())
    }
}

/// Log the specific authentication failure, hand back a generic one.
/// Non-authentication errors pass through untouched.
fn deny(step: &'static str, err: AppError) -> AppError {
    match err {
        AppError::Auth(cause) => {
            tracing::warn!(step = step, cause = %cause, "Authentication failed");
            AuthError::Unauthorized.into()
        }
        other => other,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
