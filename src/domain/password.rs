//! Password value object - Domain layer password handling.
//!
//! Wraps Argon2id hashing. The stored form is a PHC string that carries the
//! algorithm identifier, parameters and salt, so verification needs nothing
//! but the string itself.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::errors::{AppError, AppResult};

/// Hash of a random throwaway password, verified against when a login names
/// an unknown user so both paths pay the same hashing cost.
static DUMMY_PASSWORD: Lazy<Option<Password>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Password::hash(salt.as_str()).ok()
});

/// Password value object that handles hashing and verification.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain text password with a freshly generated salt.
    ///
    /// # Errors
    /// Returns an internal error if the hasher itself fails.
    pub fn hash(plain_text: &str) -> AppResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Shared dummy hash used to equalize work for unknown usernames.
    pub fn dummy() -> Option<&'static Password> {
        Lazy::force(&DUMMY_PASSWORD).as_ref()
    }

    #[cfg(test)]
    pub(crate) fn dummy_is_ready() -> bool {
        Lazy::get(&DUMMY_PASSWORD).is_some_and(Option::is_some)
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// The digest comparison is constant-time. A malformed or foreign hash
    /// string verifies as `false`.
    pub fn verify(&self, plain_text: &str) -> bool {
        let parsed = match PasswordHash::new(&self.hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Unparseable password hash: {}", e);
                return false;
            }
        };

        Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok()
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}
