//! Credential repository - lookup and insert over the `users` table.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::config::MSG_USERNAME_TAKEN;
use crate::domain::{Credential, NewCredential};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Credential store trait for dependency injection.
///
/// The store owns username uniqueness; callers may check first but must
/// still expect `AppError::Conflict` from `insert`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Find a credential by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>>;

    /// Persist a new credential; the store assigns the id.
    async fn insert(&self, credential: NewCredential) -> AppResult<Credential>;
}

/// SeaORM-backed credential store.
pub struct CredentialStore {
    db: DatabaseConnection,
}

impl CredentialStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map a unique-index violation to the same conflict the service raises.
fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::info!("Username uniqueness enforced by store: {}", detail);
            AppError::conflict(MSG_USERNAME_TAKEN)
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl CredentialRepository for CredentialStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Credential::from))
    }

    async fn insert(&self, credential: NewCredential) -> AppResult<Credential> {
        let active_model = ActiveModel {
            username: Set(credential.username),
            password_hash: Set(credential.password_hash.into_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(map_insert_error)?;

        Ok(Credential::from(model))
    }
}
