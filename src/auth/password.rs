/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt. Policy checks (length limits) live
/// in `validators`; the hasher accepts any input.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// bcrypt's accepted cost range. The crate keeps its own bounds private.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt with a fresh random salt
    ///
    /// # Errors
    /// Returns `Internal` only if bcrypt itself fails
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    ///
    /// A mismatch is `Ok(false)`. Only an unparseable stored hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
