use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid request: {0}")]
    Request(String),
}

/// Failure talking to the authorization server's admin or public API.
#[derive(Debug, Error)]
pub enum AdminApiError {
    #[error("HTTP {status} from the authorization server: {payload}")]
    Http { status: StatusCode, payload: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl AdminApiError {
    /// Machine code of the failure: the HTTP status, or 0 when no response was received.
    pub fn code(&self) -> u16 {
        match self {
            AdminApiError::Http { status, .. } => status.as_u16(),
            AdminApiError::Decode(_) => StatusCode::BAD_GATEWAY.as_u16(),
            AdminApiError::Transport(_) => 0,
        }
    }

    /// Raw upstream payload, or the local error text when there is none.
    pub fn payload(&self) -> String {
        match self {
            AdminApiError::Http { payload, .. } => payload.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminApiError::Http { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Failure calling a user store. An explicit rejection is not an error: it is
/// a successful call whose reply says `succeeded: false`.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("HTTP {status} from user store: {payload}")]
    Http { status: StatusCode, payload: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No user store name was given")]
    MissingStore,
    #[error("Unsupported user store: {0}")]
    UnsupportedStore(String),
    #[error("TLS setup failed for user store {store}: {reason}")]
    Tls { store: String, reason: String },
}

/// Reasons a back-channel logout token is refused. Callers only ever see one
/// opaque rejection; the variant is for logs.
#[derive(Debug, Error)]
pub enum LogoutTokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("No signing key matches the token")]
    UnknownKey,
    #[error("Algorithm {0:?} is not accepted")]
    UnsupportedAlgorithm(jsonwebtoken::Algorithm),
    #[error("Signature or registered claims invalid: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
    #[error("Token carries neither sub nor sid")]
    MissingIdentity,
    #[error("Token carries a nonce")]
    NoncePresent,
    #[error("Token has no back-channel logout event")]
    MissingLogoutEvent,
}

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("Revocation storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum TlsSetupError {
    #[error("Cannot read CA bundle {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CA bundle {0} contains no usable certificate")]
    NoCertificates(String),
    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_api_error_exposes_code_and_payload() {
        let err = AdminApiError::Http {
            status: StatusCode::NOT_FOUND,
            payload: r#"{"error":"Not Found"}"#.to_string(),
        };
        assert_eq!(err.code(), 404);
        assert_eq!(err.payload(), r#"{"error":"Not Found"}"#);
        assert!(err.is_not_found());

        let err = AdminApiError::from(TransportError::Network("connection refused".into()));
        assert_eq!(err.code(), 0);
        assert!(err.payload().contains("connection refused"));
        assert!(!err.is_not_found());
    }
}
