//! Credential domain entity.

use crate::domain::Password;

/// A registered principal as stored in the credential table.
///
/// `id` is assigned by the store on insert and never changes afterwards.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: i64,
    pub username: String,
    pub password_hash: Password,
}

/// A credential that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub password_hash: Password,
}

impl NewCredential {
    pub fn new(username: impl Into<String>, password_hash: Password) -> Self {
        Self {
            username: username.into(),
            password_hash,
        }
    }

    /// Attach the identifier the store assigned.
    pub fn with_id(self, id: i64) -> Credential {
        Credential {
            id,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

impl Credential {
    /// Check a plain text password against the stored hash.
    pub fn verify_password(&self, plain_text: &str) -> bool {
        self.password_hash.verify(plain_text)
    }
}
