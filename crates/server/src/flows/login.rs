//! Login endpoints.
//!
//! - `GET /login` resolves the login challenge and either completes it
//!   straight away or shows the credential form
//! - `POST /login` checks the credentials against the client's user store

use super::decision::rejection;
use super::error::{ErrorRedirect, TraceId};
use super::resources::{
    Flow, CHALLENGE_REQUIRED, INVALID_CLIENT, INVALID_CLIENT_DESCRIPTION, INVALID_REQUEST,
    INVALID_REQUEST_DESCRIPTION, MISSING_STORE_DEBUG, MISSING_STORE_HINT, PASSWORD_REQUIRED,
    STORE_REQUIRED, USERNAME_REQUIRED,
};
use super::{Decision, admin_api_failure, flow_context, non_blank};
use crate::AppState;
use crate::hydra::AcceptLoginRequest;
use crate::users::AuthRequest;
use crate::views::{self, LoginView};
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, error, trace, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginQuery {
    /// Challenge issued by the authorization server.
    pub login_challenge: Option<String>,
}

/// Credential form. Missing fields deserialize as empty so they can be
/// reported next to their inputs.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("challenge", &self.challenge)
            .field("store", &self.store)
            .field("username", &self.username)
            .field("remember_me", &self.remember_me)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    /// The form as submitted, password excluded, with a message for every blank field.
    fn to_view(&self) -> LoginView {
        let required = |value: &str, message: &str| {
            value.trim().is_empty().then(|| message.to_string())
        };
        LoginView {
            challenge: self.challenge.clone(),
            store: self.store.clone(),
            username: self.username.clone(),
            remember_me: self.remember_me,
            errors: Vec::new(),
            challenge_error: required(&self.challenge, CHALLENGE_REQUIRED),
            store_error: required(&self.store, STORE_REQUIRED),
            username_error: required(&self.username, USERNAME_REQUIRED),
            password_error: required(&self.password, PASSWORD_REQUIRED),
        }
    }
}

impl LoginView {
    fn is_valid(&self) -> bool {
        self.challenge_error.is_none()
            && self.store_error.is_none()
            && self.username_error.is_none()
            && self.password_error.is_none()
    }
}

/// Submits a login decision and follows the authorization server's redirect.
async fn submit(
    state: &AppState,
    errors: &ErrorRedirect<'_>,
    challenge: &str,
    decision: Decision<AcceptLoginRequest>,
) -> Response {
    match decision.submit(state.hydra.as_ref(), challenge).await {
        Ok(completed) => {
            debug!("Login request completed. Redirecting to the authorization server.");
            trace!(redirect_to = %completed.redirect_to);
            Redirect::to(&completed.redirect_to).into_response()
        }
        Err(e) => {
            error!("Failed to submit the login decision: {e}");
            let accepted = matches!(decision, Decision::Accept(_));
            admin_api_failure(errors, Flow::Login, accepted, &e).into_response()
        }
    }
}

/// Display the login page.
#[tracing::instrument(skip(state, trace))]
#[utoipa::path(
    get,
    path = "/login",
    tag = super::FLOWS_TAG,
    operation_id = "Login Page",
    summary = "Resolve a login challenge",
    description = "Fetches the login request named by the challenge. When the authorization server reports that the user \
                   is already authenticated the request is accepted immediately; otherwise the credential form is shown.\n\n\
                   Clients without a `store` entry in their metadata are rejected with `invalid_client`.",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login form HTML"),
        (status = 303, description = "Redirect to the authorization server or to the error page"),
    )
)]
pub async fn login_page(
    State(state): State<AppState>,
    trace: TraceId,
    Query(query): Query<LoginQuery>,
) -> Response {
    let config = state.config.snapshot();
    let errors = ErrorRedirect::new(&trace, config.auth.show_debug);
    let flow = Flow::Login;

    let Some(challenge) = non_blank(query.login_challenge) else {
        warn!("Login challenge is missing.");
        return errors
            .to(
                INVALID_REQUEST,
                INVALID_REQUEST_DESCRIPTION,
                flow.challenge_missing_hint(),
                flow.challenge_missing_debug(),
            )
            .into_response();
    };

    debug!("Retrieving the login request.");
    let login_request = match state.hydra.get_login_request(&challenge).await {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to retrieve the login request: {e}");
            return errors
                .to(
                    INVALID_REQUEST,
                    INVALID_REQUEST_DESCRIPTION,
                    flow.challenge_invalid_hint(),
                    &flow.challenge_invalid_debug(e.code(), &e.payload()),
                )
                .into_response();
        }
    };

    let Some(store) = login_request.client.store() else {
        warn!(client_id = %login_request.client.client_id, "Client has no user store, rejecting the login request.");
        let decision = Decision::Reject(rejection(
            config.auth.show_debug,
            StatusCode::INTERNAL_SERVER_ERROR,
            INVALID_CLIENT,
            INVALID_CLIENT_DESCRIPTION,
            MISSING_STORE_HINT,
            MISSING_STORE_DEBUG.to_string(),
        ));
        return submit(&state, &errors, &challenge, decision).await;
    };

    if login_request.skip {
        debug!("Login form not required, completing the login request.");
        let decision = Decision::Accept(AcceptLoginRequest {
            subject: login_request.subject,
            remember: None,
            remember_for: None,
            context: flow_context(&store, None),
        });
        return submit(&state, &errors, &challenge, decision).await;
    }

    views::render(&LoginView {
        challenge,
        store,
        ..LoginView::default()
    })
}

/// Handle credential submission.
#[tracing::instrument(skip(state, trace, form), fields(store = %form.store, username = %form.username))]
#[utoipa::path(
    post,
    path = "/login",
    tag = super::FLOWS_TAG,
    operation_id = "Login Submit",
    summary = "Submit login credentials",
    description = "Authenticates the user with the named user store. On success the login request is accepted and the \
                   browser is sent back to the authorization server. On failure the form is shown again and the \
                   challenge stays usable.",
    request_body(
        content = LoginForm,
        content_type = "application/x-www-form-urlencoded",
    ),
    responses(
        (status = 200, description = "Login form HTML with error messages"),
        (status = 303, description = "Redirect to the authorization server or to the error page"),
    )
)]
pub async fn login_submit(
    State(state): State<AppState>,
    trace: TraceId,
    Form(form): Form<LoginForm>,
) -> Response {
    let config = state.config.snapshot();
    let mut view = form.to_view();
    if !view.is_valid() {
        debug!("Login form is incomplete.");
        return views::render(&view);
    }

    let client = match state.stores.create_client(&form.store) {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot create the user store client: {e}");
            view.errors
                .push(config.messages.authentication_failure.clone());
            return views::render(&view);
        }
    };

    let request = AuthRequest {
        username: form.username.clone(),
        password: form.password.clone(),
    };
    match client.authenticate(&request).await {
        Ok(reply) if reply.succeeded => {
            debug!("Authentication succeeded. Completing the login request.");
            let errors = ErrorRedirect::new(&trace, config.auth.show_debug);
            let decision = Decision::Accept(AcceptLoginRequest {
                subject: reply.subject,
                remember: Some(form.remember_me),
                remember_for: Some(config.auth.remember_for_seconds),
                context: flow_context(&form.store, Some(form.remember_me)),
            });
            return submit(&state, &errors, &form.challenge, decision).await;
        }
        Ok(reply) => {
            debug!(error = %reply.error, "Authentication refused by the user store.");
            view.errors.push(
                config
                    .messages
                    .authentication_failure(&form.store, &reply.error)
                    .to_string(),
            );
        }
        Err(e) => {
            error!("Authentication with the user store failed: {e}");
            view.errors
                .push(config.messages.authentication_failure.clone());
        }
    }

    views::render(&view)
}
