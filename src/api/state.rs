//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{CredentialRepository, CredentialStore, Database};
use crate::services::{AuthService, Authenticator, TokenService};

/// Shared handles for request handlers and middleware.
///
/// Collaborators that only need to check tokens get the token service, never
/// the signing key.
#[derive(Clone)]
pub struct AppState {
    /// Registration and login
    pub auth_service: Arc<dyn AuthService>,
    /// Token issuance and validation
    pub token_service: Arc<TokenService>,
}

impl AppState {
    /// Wire the production services over a database connection.
    pub fn from_config(database: &Database, config: &Config) -> Self {
        let credentials = Arc::new(CredentialStore::new(database.get_connection()));
        Self::with_repository(credentials, config)
    }

    /// Wire the services over any credential repository.
    pub fn with_repository(
        credentials: Arc<dyn CredentialRepository>,
        config: &Config,
    ) -> Self {
        let token_service = Arc::new(TokenService::new(config.jwt_secret()));
        let auth_service = Arc::new(Authenticator::new(credentials, token_service.clone()));

        Self {
            auth_service,
            token_service,
        }
    }
}
