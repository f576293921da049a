use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ChirpRepository, RefreshTokenRepository, UserRepository};
use crate::domain::{Chirp, ChirpQuery, NewRefreshToken, RefreshToken, SortOrder, User};
use crate::error::DatabaseError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
    // insertion order doubles as creation order
    chirps: Vec<Chirp>,
}

/// In-process store with the same uniqueness and cascade rules as the
/// PostgreSQL schema. The lock is never held across an await point.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DatabaseError> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::UnexpectedError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        self.tables()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))
    }

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn upgrade_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let mut tables = self.tables()?;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_all_users(&self) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        tables.users.clear();
        tables.refresh_tokens.clear();
        tables.chirps.clear();
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn create_refresh_token(
        &self,
        params: NewRefreshToken,
    ) -> Result<RefreshToken, DatabaseError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&params.user_id) {
            return Err(DatabaseError::QueryExecution(
                "refresh_tokens_user_id_fkey".to_string(),
            ));
        }
        if tables.refresh_tokens.contains_key(&params.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }
        let now = Utc::now();
        let record = RefreshToken {
            token: params.token,
            user_id: params.user_id,
            created_at: now,
            updated_at: now,
            expires_at: params.expires_at,
            revoked_at: None,
        };
        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, DatabaseError> {
        self.tables()?
            .refresh_tokens
            .get(token)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("refresh token".to_string()))
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        if let Some(record) = tables.refresh_tokens.get_mut(token) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(at);
                record.updated_at = at;
            }
        }
        Ok(())
    }

    async fn delete_all_refresh_tokens(&self) -> Result<(), DatabaseError> {
        self.tables()?.refresh_tokens.clear();
        Ok(())
    }
}

#[async_trait]
impl ChirpRepository for MemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, DatabaseError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::QueryExecution(
                "chirps_user_id_fkey".to_string(),
            ));
        }
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            user_id,
            body: body.to_string(),
        };
        tables.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self, query: &ChirpQuery) -> Result<Vec<Chirp>, DatabaseError> {
        let tables = self.tables()?;
        let mut chirps: Vec<Chirp> = tables
            .chirps
            .iter()
            .filter(|c| query.author_id.map_or(true, |author| c.user_id == author))
            .cloned()
            .collect();
        if query.sort == SortOrder::Desc {
            chirps.reverse();
        }
        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Chirp, DatabaseError> {
        self.tables()?
            .chirps
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("chirp {}", id)))
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        let before = tables.chirps.len();
        tables.chirps.retain(|c| c.id != id);
        if tables.chirps.len() == before {
            return Err(DatabaseError::NotFound(format!("chirp {}", id)));
        }
        Ok(())
    }

    async fn delete_all_chirps(&self) -> Result<(), DatabaseError> {
        self.tables()?.chirps.clear();
        Ok(())
    }
}
