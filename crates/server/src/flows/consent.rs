//! Consent endpoint.
//!
//! Consent is decided from static policy: every requested scope is granted and
//! the claims mapped to those scopes are fetched from the client's user store.

use super::decision::rejection;
use super::error::{ErrorRedirect, TraceId};
use super::resources::{
    self, Flow, CLAIMS_FETCH_FAILED_HINT, INVALID_CLIENT, INVALID_CLIENT_DESCRIPTION,
    INVALID_REQUEST, INVALID_REQUEST_DESCRIPTION, MISSING_STORE_DEBUG, MISSING_STORE_HINT,
    UNSUPPORTED_STORE_HINT, USER_STORE_INTERACTION_FAILURE,
    USER_STORE_INTERACTION_FAILURE_DESCRIPTION,
};
use super::{Decision, admin_api_failure, non_blank};
use crate::AppState;
use crate::config::AppConfig;
use crate::error::ProviderError;
use crate::hydra::{AcceptConsentRequest, ConsentRequest, ConsentSession, RejectRequest};
use crate::users::{ClaimsRequest, IdentifierType};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, trace, warn};
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ConsentQuery {
    /// Challenge issued by the authorization server.
    pub consent_challenge: Option<String>,
}

fn invalid_client(config: &AppConfig, hint: &str, debug: String) -> RejectRequest {
    rejection(
        config.auth.show_debug,
        StatusCode::INTERNAL_SERVER_ERROR,
        INVALID_CLIENT,
        INVALID_CLIENT_DESCRIPTION,
        hint,
        debug,
    )
}

fn claims_fetch_failed(config: &AppConfig, store: &str, error: &str) -> RejectRequest {
    rejection(
        config.auth.show_debug,
        StatusCode::INTERNAL_SERVER_ERROR,
        USER_STORE_INTERACTION_FAILURE,
        USER_STORE_INTERACTION_FAILURE_DESCRIPTION,
        CLAIMS_FETCH_FAILED_HINT,
        resources::claims_fetch_failed_debug(store, error),
    )
}

/// Works out the decision for a resolved consent request.
async fn decide(
    state: &AppState,
    config: &AppConfig,
    request: ConsentRequest,
) -> Decision<AcceptConsentRequest> {
    let Some(store) = request.client.store() else {
        warn!(client_id = %request.client.client_id, "Client has no user store.");
        return Decision::Reject(invalid_client(
            config,
            MISSING_STORE_HINT,
            MISSING_STORE_DEBUG.to_string(),
        ));
    };

    let client = match state.stores.create_client(&store) {
        Ok(client) => client,
        Err(ProviderError::MissingStore) => {
            return Decision::Reject(invalid_client(
                config,
                MISSING_STORE_HINT,
                MISSING_STORE_DEBUG.to_string(),
            ));
        }
        Err(ProviderError::UnsupportedStore(name)) => {
            warn!(store = %name, "Client names an unsupported user store.");
            return Decision::Reject(invalid_client(
                config,
                UNSUPPORTED_STORE_HINT,
                resources::unsupported_store_debug(&name),
            ));
        }
        Err(e) => {
            error!("Cannot create the user store client: {e}");
            return Decision::Reject(claims_fetch_failed(config, &store, "transport_unavailable"));
        }
    };

    let claims_request = ClaimsRequest {
        identifier: request.subject.clone(),
        identifier_type: IdentifierType::Subject,
        claims: config.auth.claims_for_scopes(&request.requested_scope),
    };
    debug!(store = %store, claims = ?claims_request.claims, "Fetching claims.");

    let claims = match client.find_claims(&claims_request).await {
        Ok(reply) if reply.succeeded => reply.claims,
        Ok(reply) => {
            warn!(store = %store, error = %reply.error, "Claims fetch refused by the user store.");
            return Decision::Reject(claims_fetch_failed(config, &store, &reply.error));
        }
        Err(e) => {
            error!(store = %store, "Claims fetch failed: {e}");
            return Decision::Reject(claims_fetch_failed(config, &store, &e.to_string()));
        }
    };

    let handled_at = state.clock.now().format(&Rfc3339).unwrap_or_else(|e| {
        warn!("Cannot format the consent time: {e}");
        String::new()
    });
    Decision::Accept(AcceptConsentRequest {
        grant_scope: request.requested_scope,
        grant_access_token_audience: request.requested_access_token_audience,
        handled_at,
        remember: request.skip || request.client.remember(),
        remember_for: config.auth.remember_for_seconds,
        session: ConsentSession {
            access_token: claims.clone(),
            id_token: claims,
        },
    })
}

/// Resolve a consent challenge.
#[tracing::instrument(skip(state, trace))]
#[utoipa::path(
    get,
    path = "/consent",
    tag = super::FLOWS_TAG,
    operation_id = "Consent",
    summary = "Resolve a consent challenge",
    description = "Grants every requested scope and audience, attaching the claims configured for the requested scopes \
                   to both the access token and the ID token. There is no interactive consent screen.\n\n\
                   Clients without a supported `store` are rejected with `invalid_client`; claim lookup failures are \
                   rejected with `user_store_interaction_failure`.",
    params(ConsentQuery),
    responses(
        (status = 303, description = "Redirect to the authorization server or to the error page"),
    )
)]
pub async fn consent(
    State(state): State<AppState>,
    trace: TraceId,
    Query(query): Query<ConsentQuery>,
) -> Response {
    let config = state.config.snapshot();
    let errors = ErrorRedirect::new(&trace, config.auth.show_debug);
    let flow = Flow::Consent;

    let Some(challenge) = non_blank(query.consent_challenge) else {
        warn!("Consent challenge is missing.");
        return errors
            .to(
                INVALID_REQUEST,
                INVALID_REQUEST_DESCRIPTION,
                flow.challenge_missing_hint(),
                flow.challenge_missing_debug(),
            )
            .into_response();
    };

    debug!("Retrieving the consent request.");
    let consent_request = match state.hydra.get_consent_request(&challenge).await {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to retrieve the consent request: {e}");
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

    let decision = decide(&state, &config, consent_request).await;
    match decision.submit(state.hydra.as_ref(), &challenge).await {
        Ok(completed) => {
            debug!("Consent request handled. Redirecting to the authorization server.");
            trace!(redirect_to = %completed.redirect_to);
            Redirect::to(&completed.redirect_to).into_response()
        }
        Err(e) => {
            error!("Failed to submit the consent decision: {e}");
            let accepted = matches!(decision, Decision::Accept(_));
            admin_api_failure(&errors, flow, accepted, &e).into_response()
        }
    }
}
