//! Password hashing and verification using bcrypt

use crate::error::AppError;

/// bcrypt rejects inputs longer than 72 bytes. The bound is enforced here
/// explicitly instead of letting the algorithm truncate silently.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hasher with configurable cost factor
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create hasher with the library default cost
    pub fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Create hasher with an explicit cost (tests use the minimum cost to
    /// keep suites fast; production code never calls this)
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password with a fresh random salt.
    ///
    /// The resulting string embeds the algorithm version, cost and salt.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::Validation(format!(
                "Password must not exceed {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        bcrypt::hash(password, self.cost).map_err(|e| {
            tracing::error!("Failed to hash password: {:?}", e);
            AppError::Internal(format!("Failed to hash password: {}", e))
        })
    }

    /// Verify a password against a stored hash.
    ///
    /// Returns false for a mismatch and for a malformed hash; never errors,
    /// so a corrupted stored hash behaves like a wrong password.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
