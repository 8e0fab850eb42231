//! Error page and the redirects leading to it.

use crate::views::{self, ErrorView};
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::response::{Redirect, Response};
use serde::Deserialize;
use std::convert::Infallible;
use url::form_urlencoded;
use utoipa::IntoParams;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier correlating a user-visible error with the logs: the incoming
/// `x-request-id` header, or a fresh UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for TraceId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(TraceId(id))
    }
}

/// Redirects the browser to `/error`. `debug` travels only when `show_debug` is set.
pub fn redirect_to_error(
    trace: &TraceId,
    show_debug: bool,
    error: &str,
    description: &str,
    hint: &str,
    debug: &str,
) -> Redirect {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("trace_identifier", &trace.0)
        .append_pair("error", error)
        .append_pair("error_description", description)
        .append_pair("error_hint", hint);
    if show_debug {
        query.append_pair("error_debug", debug);
    }
    Redirect::to(&format!("/error?{}", query.finish()))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ErrorQuery {
    pub trace_identifier: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub error_hint: Option<String>,
    pub error_debug: Option<String>,
}

/// Render the error page.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/error",
    tag = super::FLOWS_TAG,
    operation_id = "Error Page",
    summary = "Display an error",
    description = "Renders the error reached through redirects from the login, consent and logout flows.",
    params(ErrorQuery),
    responses(
        (status = 200, description = "Error page HTML"),
    )
)]
pub async fn error_page(trace: TraceId, Query(query): Query<ErrorQuery>) -> Response {
    views::render(&ErrorView {
        trace_identifier: query.trace_identifier.unwrap_or(trace.0),
        error: query.error,
        error_description: query.error_description,
        error_hint: query.error_hint,
        error_debug: query.error_debug,
    })
}

/// Helper carrying the per-request bits every error redirect needs.
pub struct ErrorRedirect<'a> {
    pub trace: &'a TraceId,
    pub show_debug: bool,
}

impl<'a> ErrorRedirect<'a> {
    pub fn new(trace: &'a TraceId, show_debug: bool) -> Self {
        Self { trace, show_debug }
    }

    pub fn to(&self, error: &str, description: &str, hint: &str, debug: &str) -> Redirect {
        redirect_to_error(self.trace, self.show_debug, error, description, hint, debug)
    }
}
