//! Wellness Auth - authentication backend for the wellness tracker.
//!
//! Registration, credential verification and stateless session tokens,
//! served over HTTP with Axum and backed by a SeaORM credential table.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Credentials and the password value object
//! - **services**: Token issuance/validation, registration and login
//! - **infra**: Database connection, migrations, credential repository
//! - **api**: HTTP handlers, middleware, and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Credential, NewCredential, Password};
pub use errors::{AppError, AppResult};
pub use services::{Claims, TokenError, TokenService};
