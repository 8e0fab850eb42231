//! Login, consent and logout provider for an OAuth2/OpenID Connect
//! authorization server.
//!
//! The authorization server hands interactive steps to this service through
//! one-time challenges. Credentials and claims are looked up in pluggable user
//! stores, and back-channel logout notices feed a revocation record that a
//! session layer can consult on later requests.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::SharedConfig;
use crate::hydra::AuthorizationServer;
use crate::revocation::RevocationStore;
use crate::users::UserStoreProvider;

pub mod api;
pub mod config;
pub mod entity;
pub mod error;
pub mod flows;
pub mod hydra;
pub mod logout_token;
pub mod revocation;
pub mod transport;
pub mod users;
pub mod views;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Shared handles every request handler works with.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub hydra: Arc<dyn AuthorizationServer>,
    pub stores: Arc<dyn UserStoreProvider>,
    pub revocations: Arc<dyn RevocationStore>,
    pub clock: Arc<dyn Clock>,
}
