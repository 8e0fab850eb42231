//! The single verdict submitted for a challenge.

use crate::error::AdminApiError;
use crate::hydra::{
    AcceptConsentRequest, AcceptLoginRequest, AuthorizationServer, CompletedRequest,
    RejectRequest,
};
use axum::http::StatusCode;

/// Exactly one decision is submitted per challenge; submitting consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<A, R = RejectRequest> {
    Accept(A),
    Reject(R),
}

/// Logout carries no payload in either direction.
pub type LogoutDecision = Decision<(), ()>;

/// Builds a reject body. `debug` is attached only when `show_debug` is set.
pub fn rejection(
    show_debug: bool,
    status: StatusCode,
    error: &str,
    description: &str,
    hint: &str,
    debug: String,
) -> RejectRequest {
    RejectRequest {
        status_code: status.as_u16(),
        error: error.to_string(),
        error_description: description.to_string(),
        error_hint: hint.to_string(),
        error_debug: show_debug.then_some(debug),
    }
}

impl Decision<AcceptLoginRequest> {
    pub async fn submit(
        &self,
        server: &dyn AuthorizationServer,
        challenge: &str,
    ) -> Result<CompletedRequest, AdminApiError> {
        match self {
            Decision::Accept(body) => server.accept_login_request(challenge, body).await,
            Decision::Reject(body) => server.reject_login_request(challenge, body).await,
        }
    }
}

impl Decision<AcceptConsentRequest> {
    pub async fn submit(
        &self,
        server: &dyn AuthorizationServer,
        challenge: &str,
    ) -> Result<CompletedRequest, AdminApiError> {
        match self {
            Decision::Accept(body) => server.accept_consent_request(challenge, body).await,
            Decision::Reject(body) => server.reject_consent_request(challenge, body).await,
        }
    }
}

impl LogoutDecision {
    /// An accepted logout continues at the returned URL; a rejected one has none.
    pub async fn submit(
        &self,
        server: &dyn AuthorizationServer,
        challenge: &str,
    ) -> Result<Option<CompletedRequest>, AdminApiError> {
        match self {
            Decision::Accept(()) => server.accept_logout_request(challenge).await.map(Some),
            Decision::Reject(()) => server.reject_logout_request(challenge).await.map(|()| None),
        }
    }
}
