//! Bearer token middleware.
//!
//! Nothing in the router mounts this yet; it is the entry point for routes
//! that need an authenticated caller.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::errors::AppError;

/// Authenticated caller extracted from a validated token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Validates the bearer token and injects `CurrentUser` into the request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.token_service.validate(token)?;

    let current_user = CurrentUser {
        issued_at: claims.issued_at().ok_or(AppError::Unauthorized)?,
        expires_at: claims.expires_at().ok_or(AppError::Unauthorized)?,
        username: claims.sub,
    };

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}
