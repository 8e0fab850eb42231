//! OpenAPI/Utoipa configuration.

use crate::flows::FLOWS_TAG;
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Login Consent Provider",
        version = "1.0.0",
        description = "Login, consent and logout endpoints for an OAuth2/OpenID Connect authorization server."
    ),
    tags(
        (name = FLOWS_TAG, description = "Browser-facing flows and the back-channel logout receiver")
    )
)]
pub struct ApiDoc;
