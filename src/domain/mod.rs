//! Domain layer - Core business entities and logic
//!
//! Credentials and the password value object. Nothing here touches the
//! database or HTTP.

pub mod credential;
pub mod password;

pub use credential::{Credential, NewCredential};
pub use password::Password;
