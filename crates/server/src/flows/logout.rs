//! Logout endpoints.

use super::error::{ErrorRedirect, TraceId};
use super::resources::{
    self, ADMIN_API_INTERACTION_FAILURE, ADMIN_API_INTERACTION_FAILURE_DESCRIPTION,
    DISCOVERY_FAILED_HINT, Flow, INVALID_REQUEST, INVALID_REQUEST_DESCRIPTION,
};
use super::{Decision, LogoutDecision, admin_api_failure, non_blank};
use crate::AppState;
use crate::views::{self, LoggedOutView, LogoutRejectedView, LogoutView};
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, error, trace, warn};
use url::{Url, form_urlencoded};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogoutQuery {
    /// Challenge issued by the authorization server. Without it a global
    /// logout is started.
    pub logout_challenge: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LogoutForm {
    #[serde(default)]
    pub challenge: String,
    /// `yes` confirms the logout; anything else cancels it.
    #[serde(default)]
    pub action: String,
    /// Where to send the browser when the logout is cancelled.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Root of an absolute http(s) URL: same scheme, host and port, path `/`,
/// no query, fragment or credentials.
fn root_of(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    // Only fails for URLs without a host, excluded above.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Some(url)
}

/// Root of the relying party named by `post_logout_redirect_uri` in the
/// original logout request.
pub fn cancel_destination(request_url: Option<&str>) -> Option<String> {
    let (_, query) = request_url?.split_once('?')?;
    let target = form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "post_logout_redirect_uri")
        .map(|(_, value)| value.into_owned())?;
    root_of(&target).map(Into::into)
}

/// Start or confirm a logout.
#[tracing::instrument(skip(state, trace))]
#[utoipa::path(
    get,
    path = "/logout",
    tag = super::FLOWS_TAG,
    operation_id = "Logout Page",
    summary = "Resolve a logout challenge",
    description = "Without a challenge, redirects to the authorization server's end-session endpoint to start a global logout. \
                   With a challenge, shows a confirmation page.",
    params(LogoutQuery),
    responses(
        (status = 200, description = "Logout confirmation HTML"),
        (status = 303, description = "Redirect to the end-session endpoint or to the error page"),
    )
)]
pub async fn logout_page(
    State(state): State<AppState>,
    trace: TraceId,
    Query(query): Query<LogoutQuery>,
) -> Response {
    let config = state.config.snapshot();
    let errors = ErrorRedirect::new(&trace, config.auth.show_debug);
    let flow = Flow::Logout;

    let Some(challenge) = non_blank(query.logout_challenge) else {
        debug!("No logout challenge, starting a global logout.");
        let discovered = state.hydra.discover().await;
        return match discovered {
            Ok(document) => match document.end_session_endpoint {
                Some(endpoint) => Redirect::to(&endpoint).into_response(),
                None => {
                    error!("The OpenID configuration has no end_session_endpoint.");
                    errors
                        .to(
                            ADMIN_API_INTERACTION_FAILURE,
                            ADMIN_API_INTERACTION_FAILURE_DESCRIPTION,
                            DISCOVERY_FAILED_HINT,
                            &resources::discovery_failed_debug(200, "end_session_endpoint is missing"),
                        )
                        .into_response()
                }
            },
            Err(e) => {
                error!("OpenID configuration discovery failed: {e}");
                errors
                    .to(
                        ADMIN_API_INTERACTION_FAILURE,
                        ADMIN_API_INTERACTION_FAILURE_DESCRIPTION,
                        DISCOVERY_FAILED_HINT,
                        &resources::discovery_failed_debug(e.code(), &e.payload()),
                    )
                    .into_response()
            }
        };
    };

    debug!("Retrieving the logout request.");
    match state.hydra.get_logout_request(&challenge).await {
        Ok(request) => views::render(&LogoutView {
            redirect_url: cancel_destination(request.request_url.as_deref()),
            challenge,
        }),
        Err(e) => {
            error!("Failed to retrieve the logout request: {e}");
            errors
                .to(
                    INVALID_REQUEST,
                    INVALID_REQUEST_DESCRIPTION,
                    flow.challenge_invalid_hint(),
                    &flow.challenge_invalid_debug(e.code(), &e.payload()),
                )
                .into_response()
        }
    }
}

/// Handle the logout confirmation.
#[tracing::instrument(skip(state, trace))]
#[utoipa::path(
    post,
    path = "/logout",
    tag = super::FLOWS_TAG,
    operation_id = "Logout Submit",
    summary = "Confirm or cancel a logout",
    description = "`action=yes` accepts the logout request and follows the authorization server's redirect. Any other action \
                   rejects it and returns to the relying party when its address is known.",
    request_body(
        content = LogoutForm,
        content_type = "application/x-www-form-urlencoded",
    ),
    responses(
        (status = 200, description = "Logout cancelled page HTML"),
        (status = 303, description = "Redirect to the authorization server, the relying party or the error page"),
    )
)]
pub async fn logout_submit(
    State(state): State<AppState>,
    trace: TraceId,
    Form(form): Form<LogoutForm>,
) -> Response {
    let config = state.config.snapshot();
    let errors = ErrorRedirect::new(&trace, config.auth.show_debug);
    let flow = Flow::Logout;

    let Some(challenge) = non_blank(Some(form.challenge)) else {
        warn!("Logout challenge is missing.");
        return errors
            .to(
                INVALID_REQUEST,
                INVALID_REQUEST_DESCRIPTION,
                flow.challenge_missing_hint(),
                flow.challenge_missing_debug(),
            )
            .into_response();
    };

    let decision: LogoutDecision = if form.action == "yes" {
        Decision::Accept(())
    } else {
        Decision::Reject(())
    };

    match decision.submit(state.hydra.as_ref(), &challenge).await {
        Ok(Some(completed)) => {
            debug!("Logout request completed. Redirecting to the authorization server.");
            trace!(redirect_to = %completed.redirect_to);
            Redirect::to(&completed.redirect_to).into_response()
        }
        Ok(None) => {
            debug!("Logout request rejected.");
            match form.redirect_url.as_deref().and_then(root_of) {
                Some(url) => Redirect::to(url.as_str()).into_response(),
                None => views::render(&LogoutRejectedView),
            }
        }
        Err(e) => {
            error!("Failed to submit the logout decision: {e}");
            let accepted = matches!(decision, Decision::Accept(()));
            admin_api_failure(&errors, flow, accepted, &e).into_response()
        }
    }
}

/// Display the logged-out page.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/loggedout",
    tag = super::FLOWS_TAG,
    operation_id = "Logged Out",
    summary = "Display the logged-out page",
    responses(
        (status = 200, description = "Logged-out page HTML"),
    )
)]
pub async fn logged_out() -> Response {
    views::render(&LoggedOutView)
}
