use crate::AppState;
use crate::logout_token::validate_logout_token;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, PRAGMA},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, error, info};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BackchannelLogoutForm {
    /// Signed logout token (JWT).
    #[serde(default)]
    pub logout_token: String,
}

/// Receive a back-channel logout notice.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/backchannel-logout",
    tag = super::FLOWS_TAG,
    operation_id = "Back-Channel Logout",
    summary = "Receive a back-channel logout token",
    description = "Validates the logout token against the authorization server's current signing keys and records the \
                   named session as revoked. Every invalid token gets the same 400 response.",
    request_body(
        content = BackchannelLogoutForm,
        content_type = "application/x-www-form-urlencoded",
    ),
    responses(
        (status = 200, description = "Session recorded as revoked"),
        (status = 400, description = "Invalid logout token"),
        (status = 500, description = "The revocation could not be stored"),
    )
)]
pub async fn backchannel_logout(
    State(state): State<AppState>,
    form: Result<Form<BackchannelLogoutForm>, FormRejection>,
) -> Response {
    let status = handle(&state, form).await;
    (
        status,
        [(CACHE_CONTROL, "no-cache, no-store"), (PRAGMA, "no-cache")],
    )
        .into_response()
}

async fn handle(
    state: &AppState,
    form: Result<Form<BackchannelLogoutForm>, FormRejection>,
) -> StatusCode {
    let token = match form {
        Ok(Form(form)) if !form.logout_token.trim().is_empty() => form.logout_token,
        Ok(_) => {
            debug!("Back-channel logout without a token.");
            return StatusCode::BAD_REQUEST;
        }
        Err(e) => {
            debug!("Unreadable back-channel logout body: {e}");
            return StatusCode::BAD_REQUEST;
        }
    };

    let audience = state.config.snapshot().backchannel.client_id.clone();
    let claims = match validate_logout_token(token.trim(), state.hydra.as_ref(), &audience).await {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Rejected logout token: {e}");
            return StatusCode::BAD_REQUEST;
        }
    };

    let identity = claims.identity();
    match state.revocations.record(&identity).await {
        Ok(()) => {
            info!(subject = ?identity.subject, sid = ?identity.session_id, "Session revoked by back-channel logout");
            StatusCode::OK
        }
        Err(e) => {
            error!("Failed to record the revocation: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
