//! Record of sessions invalidated by back-channel logout.
//!
//! Records are append-only and never expire. Lookup is plain membership: a
//! [`SessionIdentity`] is revoked only if that exact pair was recorded, with
//! a missing half compared as missing.

pub mod database;
pub mod guard;
pub mod memory;

pub use database::DatabaseRevocationStore;
pub use guard::reject_revoked_sessions;
pub use memory::MemoryRevocationStore;

use crate::config::{RevocationBackend, RevocationConfig};
use crate::error::RevocationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One interactive sign-in. Either half may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub subject: Option<String>,
    pub session_id: Option<String>,
}

impl SessionIdentity {
    /// Builds an identity, treating blank strings as absent.
    pub fn new(subject: Option<String>, session_id: Option<String>) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            subject: present(subject),
            session_id: present(session_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.session_id.is_none()
    }
}

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks `identity` as logged out. Idempotent. An empty identity is ignored.
    async fn record(&self, identity: &SessionIdentity) -> Result<(), RevocationError>;

    /// Whether exactly `identity` was recorded.
    async fn is_revoked(&self, identity: &SessionIdentity) -> Result<bool, RevocationError>;
}

/// Opens the configured backing. The database backing is migrated on connect.
pub async fn open(config: &RevocationConfig) -> Result<Arc<dyn RevocationStore>, RevocationError> {
    match (config.backend, config.database_url.as_deref()) {
        (RevocationBackend::Database, Some(url)) => {
            Ok(Arc::new(DatabaseRevocationStore::connect(url).await?))
        }
        (RevocationBackend::Database, None) => Err(RevocationError::Storage(
            sea_orm::DbErr::Custom("revocation.database_url is not set".to_string()),
        )),
        (RevocationBackend::Memory, _) => Ok(Arc::new(MemoryRevocationStore::default())),
    }
}
