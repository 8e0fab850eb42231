use super::{RevocationStore, SessionIdentity};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, error};

/// Session-check hook.
///
/// A session layer running in front of this middleware places the caller's
/// [`SessionIdentity`] in the request extensions. Requests whose session has
/// been revoked are answered with 401; requests without an identity pass
/// through untouched. A storage failure fails closed with 500.
pub async fn reject_revoked_sessions(
    State(store): State<Arc<dyn RevocationStore>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(identity) = request.extensions().get::<SessionIdentity>().cloned() else {
        return next.run(request).await;
    };

    match store.is_revoked(&identity).await {
        Ok(false) => next.run(request).await,
        Ok(true) => {
            debug!(?identity, "Rejecting request for a revoked session");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => {
            error!("Failed to check session revocation: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
