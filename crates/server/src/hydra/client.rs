use super::{
    AcceptConsentRequest, AcceptLoginRequest, AuthorizationServer, CompletedRequest,
    ConsentRequest, DiscoveryDocument, LoginRequest, LogoutRequest, RejectRequest,
};
use crate::config::HydraConfig;
use crate::error::{AdminApiError, TlsSetupError, TransportError};
use crate::transport::{self, HttpsClient, RawResponse};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::AUTHORIZATION;
use hyper::http::request::Builder;
use hyper::{Method, Request};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone, Copy, Debug)]
enum ChallengeKind {
    Login,
    Consent,
    Logout,
}

impl ChallengeKind {
    fn as_str(self) -> &'static str {
        match self {
            ChallengeKind::Login => "login",
            ChallengeKind::Consent => "consent",
            ChallengeKind::Logout => "logout",
        }
    }
}

/// Client for the admin and public APIs of an ORY Hydra style server.
///
/// Transport trust and endpoints are fixed at construction; a configuration
/// reload does not rebuild this client.
#[derive(Clone)]
pub struct HydraClient {
    http: HttpsClient,
    admin_url: String,
    public_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HydraClient {
    pub fn new(config: &HydraConfig) -> Result<Self, TlsSetupError> {
        let tls = transport::tls_config(config.ca_certificate_path.as_deref())?;
        Ok(Self {
            http: transport::build_client(tls),
            admin_url: config.admin_url.trim_end_matches('/').to_string(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            api_key: config.admin_api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn request_url(
        &self,
        kind: ChallengeKind,
        action: Option<&str>,
        challenge: &str,
    ) -> Result<String, AdminApiError> {
        let kind_name = kind.as_str();
        let mut path = format!("{}/oauth2/auth/requests/{kind_name}", self.admin_url);
        if let Some(action) = action {
            path.push('/');
            path.push_str(action);
        }
        let mut url = Url::parse(&path).map_err(|e| TransportError::Request(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(&format!("{kind_name}_challenge"), challenge);
        Ok(url.into())
    }

    fn admin_request(&self, method: Method, url: &str) -> Builder {
        let builder = transport::request(method, url);
        match &self.api_key {
            Some(key) => builder.header(AUTHORIZATION, format!("ApiKey {key}")),
            None => builder,
        }
    }

    async fn exchange(&self, request: Request<Full<Bytes>>) -> Result<RawResponse, AdminApiError> {
        let response = transport::send(&self.http, request, self.timeout).await?;
        if !response.status.is_success() {
            return Err(AdminApiError::Http {
                status: response.status,
                payload: response.text(),
            });
        }
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<T, AdminApiError> {
        let response = self.exchange(request).await?;
        response
            .json()
            .map_err(|e| AdminApiError::Decode(e.to_string()))
    }

    async fn get_request<T: DeserializeOwned>(
        &self,
        kind: ChallengeKind,
        challenge: &str,
    ) -> Result<T, AdminApiError> {
        let url = self.request_url(kind, None, challenge)?;
        let request = transport::without_body(self.admin_request(Method::GET, &url))?;
        self.call(request).await
    }

    async fn put_request<B: Serialize + Sync>(
        &self,
        kind: ChallengeKind,
        action: &str,
        challenge: &str,
        body: &B,
    ) -> Result<RawResponse, AdminApiError> {
        let url = self.request_url(kind, Some(action), challenge)?;
        let request = transport::with_json(self.admin_request(Method::PUT, &url), body)?;
        self.exchange(request).await
    }

    async fn complete<B: Serialize + Sync>(
        &self,
        kind: ChallengeKind,
        action: &str,
        challenge: &str,
        body: &B,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.put_request(kind, action, challenge, body)
            .await?
            .json()
            .map_err(|e| AdminApiError::Decode(e.to_string()))
    }
}

#[derive(Deserialize)]
struct RawJwkSet {
    #[serde(default)]
    keys: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct EmptyBody {}

#[async_trait]
impl AuthorizationServer for HydraClient {
    #[tracing::instrument(skip(self))]
    async fn get_login_request(&self, challenge: &str) -> Result<LoginRequest, AdminApiError> {
        self.get_request(ChallengeKind::Login, challenge).await
    }

    #[tracing::instrument(skip(self, body))]
    async fn accept_login_request(
        &self,
        challenge: &str,
        body: &AcceptLoginRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.complete(ChallengeKind::Login, "accept", challenge, body)
            .await
    }

    #[tracing::instrument(skip(self, body))]
    async fn reject_login_request(
        &self,
        challenge: &str,
        body: &RejectRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.complete(ChallengeKind::Login, "reject", challenge, body)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_consent_request(
        &self,
        challenge: &str,
    ) -> Result<ConsentRequest, AdminApiError> {
        self.get_request(ChallengeKind::Consent, challenge).await
    }

    #[tracing::instrument(skip(self, body))]
    async fn accept_consent_request(
        &self,
        challenge: &str,
        body: &AcceptConsentRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.complete(ChallengeKind::Consent, "accept", challenge, body)
            .await
    }

    #[tracing::instrument(skip(self, body))]
    async fn reject_consent_request(
        &self,
        challenge: &str,
        body: &RejectRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.complete(ChallengeKind::Consent, "reject", challenge, body)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_logout_request(&self, challenge: &str) -> Result<LogoutRequest, AdminApiError> {
        self.get_request(ChallengeKind::Logout, challenge).await
    }

    #[tracing::instrument(skip(self))]
    async fn accept_logout_request(
        &self,
        challenge: &str,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.complete(ChallengeKind::Logout, "accept", challenge, &EmptyBody {})
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn reject_logout_request(&self, challenge: &str) -> Result<(), AdminApiError> {
        self.put_request(ChallengeKind::Logout, "reject", challenge, &EmptyBody {})
            .await
            .map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn discover(&self) -> Result<DiscoveryDocument, AdminApiError> {
        let url = format!("{}/.well-known/openid-configuration", self.public_url);
        let request = transport::without_body(transport::request(Method::GET, &url))?;
        self.call(request).await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_jwks(&self, jwks_uri: &str) -> Result<JwkSet, AdminApiError> {
        let request = transport::without_body(transport::request(Method::GET, jwks_uri))?;
        let raw: RawJwkSet = self.call(request).await?;

        let mut keys = Vec::with_capacity(raw.keys.len());
        for value in raw.keys {
            match serde_json::from_value::<Jwk>(value) {
                Ok(jwk) => keys.push(jwk),
                Err(e) => warn!("Skipping unparsable JWK from {jwks_uri}: {e}"),
            }
        }
        debug!("Fetched {} signing keys", keys.len());
        Ok(JwkSet { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(admin_url: &str) -> HydraClient {
        HydraClient::new(&HydraConfig {
            admin_url: admin_url.to_string(),
            public_url: "http://hydra:4444".to_string(),
            admin_api_key: None,
            ca_certificate_path: None,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn request_url_keeps_admin_prefix_and_encodes_challenge() {
        let hydra = client("http://hydra:4445/admin/");
        let url = hydra
            .request_url(ChallengeKind::Consent, Some("reject"), "a b&c")
            .unwrap();
        assert_eq!(
            url,
            "http://hydra:4445/admin/oauth2/auth/requests/consent/reject?consent_challenge=a+b%26c"
        );
    }

    #[test]
    fn request_url_without_action() {
        let hydra = client("http://hydra:4445");
        let url = hydra
            .request_url(ChallengeKind::Login, None, "xyz")
            .unwrap();
        assert_eq!(
            url,
            "http://hydra:4445/oauth2/auth/requests/login?login_challenge=xyz"
        );
    }
}
