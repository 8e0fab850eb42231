//! Login, consent and logout flows.
//!
//! The authorization server redirects the browser here with a challenge:
//! - `/login` authenticates the user against the client's user store
//! - `/consent` grants the requested scopes with claims from that store
//! - `/logout` confirms or cancels a sign-out
//!
//! `/backchannel-logout` receives signed logout notices server to server and
//! feeds the revocation record.

pub mod backchannel;
pub mod consent;
pub mod decision;
pub mod error;
pub mod login;
pub mod logout;
pub mod resources;

pub use decision::{Decision, LogoutDecision};
pub use error::TraceId;

use crate::AppState;
use crate::error::AdminApiError;
use crate::revocation::reject_revoked_sessions;
use axum::middleware;
use axum::response::Redirect;
use error::ErrorRedirect;
use resources::{ADMIN_API_INTERACTION_FAILURE, ADMIN_API_INTERACTION_FAILURE_DESCRIPTION, Flow};
use serde_json::{Map, Value};
use utoipa_axum::{router::OpenApiRouter, routes};

pub const FLOWS_TAG: &str = "Flows";

/// Creates the router for every flow endpoint.
pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login::login_page))
        .routes(routes!(login::login_submit))
        .routes(routes!(consent::consent))
        .routes(routes!(logout::logout_page))
        .routes(routes!(logout::logout_submit))
        .routes(routes!(logout::logged_out))
        .routes(routes!(backchannel::backchannel_logout))
        .routes(routes!(error::error_page))
        .layer(middleware::from_fn_with_state(
            state.revocations.clone(),
            reject_revoked_sessions,
        ))
        .with_state(state)
}

/// Absent, empty and whitespace-only values all count as missing.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Error redirect for a failed accept (`accepted`) or reject call.
pub(crate) fn admin_api_failure(
    errors: &ErrorRedirect<'_>,
    flow: Flow,
    accepted: bool,
    error: &AdminApiError,
) -> Redirect {
    let (hint, debug) = if accepted {
        (
            flow.complete_failed_hint(),
            flow.complete_failed_debug(error.code(), &error.payload()),
        )
    } else {
        (
            flow.reject_failed_hint(),
            flow.reject_failed_debug(error.code(), &error.payload()),
        )
    };
    errors.to(
        ADMIN_API_INTERACTION_FAILURE,
        ADMIN_API_INTERACTION_FAILURE_DESCRIPTION,
        hint,
        &debug,
    )
}

/// Context object stored with an accepted login or consent.
pub(crate) fn flow_context(store: &str, remember: Option<bool>) -> Value {
    let mut context = Map::new();
    context.insert(
        crate::hydra::STORE_KEY.to_string(),
        Value::String(store.to_string()),
    );
    if let Some(remember) = remember {
        context.insert(crate::hydra::REMEMBER_KEY.to_string(), Value::Bool(remember));
    }
    Value::Object(context)
}
