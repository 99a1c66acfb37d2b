//! Authentication service - Registration and login.
//!
//! Orchestrates the credential store, the password value object and the
//! token service. Holds no state of its own beyond shared handles.

use async_trait::async_trait;
use std::sync::Arc;

use super::TokenService;
use crate::config::MSG_USERNAME_TAKEN;
use crate::domain::{Credential, NewCredential, Password};
use crate::errors::{AppError, AppResult};
use crate::infra::CredentialRepository;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user. Does not log the user in.
    async fn register(&self, username: String, password: String) -> AppResult<()>;

    /// Verify credentials and return a signed token.
    async fn login(&self, username: String, password: String) -> AppResult<String>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    credentials: Arc<dyn CredentialRepository>,
    tokens: Arc<TokenService>,
}

impl Authenticator {
    /// Also computes the dummy hash up front so the first unknown-username
    /// login costs the same as later ones.
    pub fn new(credentials: Arc<dyn CredentialRepository>, tokens: Arc<TokenService>) -> Self {
        let _ = Password::dummy();

        Self {
            credentials,
            tokens,
        }
    }

    /// Look up and verify a credential.
    ///
    /// Unknown usernames and wrong passwords both come back as
    /// `InvalidCredentials`. Unknown usernames are still checked against a
    /// dummy hash so the two cases cost the same.
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Credential> {
        match self.credentials.find_by_username(username).await? {
            Some(credential) if credential.verify_password(password) => Ok(credential),
            Some(_) => Err(AppError::InvalidCredentials),
            None => {
                if let Some(dummy) = Password::dummy() {
                    let _ = dummy.verify(password);
                }
                Err(AppError::InvalidCredentials)
            }
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, username: String, password: String) -> AppResult<()> {
        if self.credentials.find_by_username(&username).await?.is_some() {
            tracing::info!(%username, "Registration rejected: username taken");
            return Err(AppError::conflict(MSG_USERNAME_TAKEN));
        }

        let password_hash = Password::hash(&password)?;
        let credential = self
            .credentials
            .insert(NewCredential::new(username, password_hash))
            .await?;

        tracing::info!(id = credential.id, username = %credential.username, "User registered");
        Ok(())
    }

    async fn login(&self, username: String, password: String) -> AppResult<String> {
        let credential = match self.authenticate(&username, &password).await {
            Ok(credential) => credential,
            Err(e) => {
                if matches!(e, AppError::InvalidCredentials) {
                    tracing::info!(%username, "Login failed");
                }
                return Err(e);
            }
        };

        let token = self
            .tokens
            .issue(&credential.username)
            .map_err(|e| AppError::internal(e.to_string()))?;
        tracing::info!(username = %credential.username, "Login succeeded");
        Ok(token)
    }
}
