use super::{AuthReply, AuthRequest, ClaimsReply, ClaimsRequest, UserStore};
use crate::config::UserClientConfig;
use crate::error::UserStoreError;
use crate::transport::{self, HttpsClient};
use async_trait::async_trait;
use hyper::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// JSON-over-HTTP client for one user store. Cloning shares the underlying
/// connection pool.
#[derive(Clone)]
pub struct HttpUserStore {
    store: String,
    options: UserClientConfig,
    http: HttpsClient,
}

impl HttpUserStore {
    pub fn new(store: impl Into<String>, options: UserClientConfig, http: HttpsClient) -> Self {
        Self {
            store: store.into(),
            options,
            http,
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/{operation}", self.options.address.trim_end_matches('/'))
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<T, UserStoreError> {
        let url = self.endpoint(operation);
        let request = transport::with_json(transport::request(Method::POST, &url), body)?;
        let response = transport::send(
            &self.http,
            request,
            Duration::from_secs(self.options.timeout_secs),
        )
        .await?;
        if !response.status.is_success() {
            return Err(UserStoreError::Http {
                status: response.status,
                payload: response.text(),
            });
        }
        response
            .json()
            .map_err(|e| UserStoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl UserStore for HttpUserStore {
    fn options(&self) -> &UserClientConfig {
        &self.options
    }

    #[tracing::instrument(skip(self, request), fields(store = %self.store, username = %request.username))]
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthReply, UserStoreError> {
        let reply: AuthReply = self.post("authenticate", request).await?;
        debug!(succeeded = reply.succeeded, "Authentication reply received");
        Ok(reply)
    }

    #[tracing::instrument(skip(self, request), fields(store = %self.store, claims = request.claims.len()))]
    async fn find_claims(&self, request: &ClaimsRequest) -> Result<ClaimsReply, UserStoreError> {
        let reply: ClaimsReply = self.post("claims", request).await?;
        debug!(succeeded = reply.succeeded, "Claims reply received");
        Ok(reply)
    }
}
