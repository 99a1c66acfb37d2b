//! Token service - Issues and validates signed session tokens.
//!
//! Tokens are compact HS256 JWTs carrying `sub`, `iat` and `exp`. Nothing is
//! stored server side: every check re-derives validity from the signature
//! and the expiry claim.
//!
//! # Key provisioning
//!
//! The signing key is derived once from the configured secret. A secret that
//! is missing or shorter than [`MIN_JWT_SECRET_LENGTH`] bytes is ignored and
//! a random 256-bit key is generated instead. Tokens signed with a generated
//! key stop validating once the process restarts.

use std::collections::HashSet;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{GENERATED_KEY_LENGTH, MIN_JWT_SECRET_LENGTH, TOKEN_VALIDITY_HOURS};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Verified token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the username)
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Reasons a presented token is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Where the signing key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The configured secret was long enough and is used verbatim.
    Configured,
    /// The configured secret was absent or too short; a random key was generated.
    Generated,
}

/// Symmetric signing material. Only the encode/decode halves are kept, so
/// the raw bytes cannot be read back out.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    source: KeySource,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl SigningKey {
    /// Apply the provisioning policy to a configured secret.
    ///
    /// Secrets shorter than `min_len` bytes (or absent) are never used.
    pub fn provision(secret: Option<&str>, min_len: usize) -> Self {
        match secret {
            Some(secret) if secret.len() >= min_len => {
                Self::from_bytes(secret.as_bytes(), KeySource::Configured)
            }
            Some(secret) => {
                tracing::warn!(
                    length = secret.len(),
                    required = min_len,
                    "JWT secret too short, generating a random signing key; tokens will not survive a restart"
                );
                Self::generate()
            }
            None => {
                tracing::warn!(
                    "JWT secret not configured, generating a random signing key; tokens will not survive a restart"
                );
                Self::generate()
            }
        }
    }

    /// Generate a fresh random key of HS256 strength.
    pub fn generate() -> Self {
        let mut bytes = [0u8; GENERATED_KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(&bytes, KeySource::Generated)
    }

    fn from_bytes(bytes: &[u8], source: KeySource) -> Self {
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            source,
        }
    }

    pub fn source(&self) -> KeySource {
        self.source
    }
}

/// Issues and validates tokens. Owns the signing key exclusively.
///
/// Read-only after construction, so one instance can be shared across
/// request handlers behind an `Arc`.
#[derive(Debug)]
pub struct TokenService {
    key: SigningKey,
    validity: Duration,
}

impl TokenService {
    /// Build the service from the configured secret (see module docs).
    pub fn new(secret: Option<&str>) -> Self {
        let key = SigningKey::provision(secret, MIN_JWT_SECRET_LENGTH);
        tracing::info!(source = ?key.source(), "Token signing key ready");
        Self::with_key(key)
    }

    pub fn with_key(key: SigningKey) -> Self {
        Self {
            key,
            validity: Duration::hours(TOKEN_VALIDITY_HOURS),
        }
    }

    pub fn key_source(&self) -> KeySource {
        self.key.source()
    }

    /// Issue a token for `subject` valid for the next 24 hours.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.key.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// The signature is checked first; expiry is checked here rather than by
    /// the JWT library so that a token is rejected exactly at `exp`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.key.decoding, &Self::validation())?;
        let claims = data.claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);
        validation
    }
}
