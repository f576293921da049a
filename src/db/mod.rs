/// Persistence collaborators
///
/// Repository traits for users, refresh tokens and chirps. `PgStore` backs
/// them with PostgreSQL; `MemoryStore` keeps everything in process and is
/// what the test suites run against.
///
/// Every operation distinguishes `DatabaseError::NotFound` and
/// `DatabaseError::UniqueConstraintViolation` from I/O failures.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Chirp, ChirpQuery, NewRefreshToken, RefreshToken, User};
use crate::error::DatabaseError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `UniqueConstraintViolation` when the email is taken.
    async fn create_user(&self, email: &str, hashed_password: &str)
        -> Result<User, DatabaseError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError>;

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError>;

    async fn upgrade_user(&self, id: Uuid) -> Result<User, DatabaseError>;

    /// Dev-only bulk reset. Cascades to the user's tokens and chirps.
    async fn delete_all_users(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create_refresh_token(
        &self,
        params: NewRefreshToken,
    ) -> Result<RefreshToken, DatabaseError>;

    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, DatabaseError>;

    /// Sets `revoked_at = updated_at = at` unless already revoked.
    /// Revoking an unknown or already revoked token is not an error.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    async fn delete_all_refresh_tokens(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, DatabaseError>;

    async fn list_chirps(&self, query: &ChirpQuery) -> Result<Vec<Chirp>, DatabaseError>;

    async fn get_chirp(&self, id: Uuid) -> Result<Chirp, DatabaseError>;

    async fn delete_chirp(&self, id: Uuid) -> Result<(), DatabaseError>;

    async fn delete_all_chirps(&self) -> Result<(), DatabaseError>;
}

/// Anything that can back the whole service.
pub trait Store: UserRepository + RefreshTokenRepository + ChirpRepository {}

impl<T> Store for T where T: UserRepository + RefreshTokenRepository + ChirpRepository {}
