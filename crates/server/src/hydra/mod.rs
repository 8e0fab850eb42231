//! Authorization-server collaboration.
//!
//! The flows only ever see [`AuthorizationServer`]; [`HydraClient`] implements
//! it against an ORY Hydra style admin and public API.

pub mod client;
pub mod types;

pub use client::HydraClient;
pub use types::*;

use crate::error::AdminApiError;
use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;

#[async_trait]
pub trait AuthorizationServer: Send + Sync {
    async fn get_login_request(&self, challenge: &str) -> Result<LoginRequest, AdminApiError>;

    async fn accept_login_request(
        &self,
        challenge: &str,
        body: &AcceptLoginRequest,
    ) -> Result<CompletedRequest, AdminApiError>;

    async fn reject_login_request(
        &self,
        challenge: &str,
        body: &RejectRequest,
    ) -> Result<CompletedRequest, AdminApiError>;

    async fn get_consent_request(&self, challenge: &str)
    -> Result<ConsentRequest, AdminApiError>;

    async fn accept_consent_request(
        &self,
        challenge: &str,
        body: &AcceptConsentRequest,
    ) -> Result<CompletedRequest, AdminApiError>;

    async fn reject_consent_request(
        &self,
        challenge: &str,
        body: &RejectRequest,
    ) -> Result<CompletedRequest, AdminApiError>;

    async fn get_logout_request(&self, challenge: &str) -> Result<LogoutRequest, AdminApiError>;

    async fn accept_logout_request(&self, challenge: &str)
    -> Result<CompletedRequest, AdminApiError>;

    /// A rejected logout has no follow-up URL.
    async fn reject_logout_request(&self, challenge: &str) -> Result<(), AdminApiError>;

    /// OpenID provider metadata from the public API.
    async fn discover(&self) -> Result<DiscoveryDocument, AdminApiError>;

    /// Signing keys published at `jwks_uri`. Keys that cannot be parsed are skipped.
    async fn fetch_jwks(&self, jwks_uri: &str) -> Result<JwkSet, AdminApiError>;
}
