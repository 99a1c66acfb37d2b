//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection and migrations
//! - The credential repository

pub mod db;
pub mod repositories;

pub use db::{Database, Migrator};
pub use repositories::{CredentialRepository, CredentialStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockCredentialRepository;
