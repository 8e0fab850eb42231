//! Pluggable credential backends ("user stores").
//!
//! Each store is a remote service answering two JSON calls:
//! - `POST {address}/authenticate` verifies a username and password
//! - `POST {address}/claims` returns claim values for a user
//!
//! An explicit refusal comes back as a successful call with `succeeded: false`
//! and a store-specific `error` code; only transport or protocol problems are
//! reported as [`UserStoreError`].

pub mod client;
pub mod provider;

pub use client::HttpUserStore;
pub use provider::{ChannelProvider, UserStoreProvider};

use crate::config::UserClientConfig;
use crate::error::UserStoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    Subject,
    Username,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsRequest {
    pub identifier: String,
    pub identifier_type: IdentifierType,
    pub claims: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsReply {
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub claims: BTreeMap<String, String>,
    #[serde(default)]
    pub error: String,
}

/// Client bound to one user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Settings the client was created with.
    fn options(&self) -> &UserClientConfig;

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthReply, UserStoreError>;

    async fn find_claims(&self, request: &ClaimsRequest) -> Result<ClaimsReply, UserStoreError>;
}
