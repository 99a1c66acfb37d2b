//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::OpenApi;

use crate::api::handlers::auth_handler;

/// OpenAPI documentation for the authentication endpoints
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wellness Auth",
        version = "0.1.0",
        description = "Registration and login for the wellness tracker",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
    ),
    components(
        schemas(
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::AuthResponse,
        )
    ),
    tags(
        (name = "Authentication", description = "User registration and login")
    )
)]
pub struct ApiDoc;
