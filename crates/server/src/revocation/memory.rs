use super::{RevocationStore, SessionIdentity};
use crate::error::RevocationError;
use async_trait::async_trait;
use dashmap::DashSet;

/// Process-local revocation record. Only correct for a single instance.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    identities: DashSet<SessionIdentity>,
}

impl MemoryRevocationStore {
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn record(&self, identity: &SessionIdentity) -> Result<(), RevocationError> {
        if !identity.is_empty() {
            self.identities.insert(identity.clone());
        }
        Ok(())
    }

    async fn is_revoked(&self, identity: &SessionIdentity) -> Result<bool, RevocationError> {
        Ok(self.identities.contains(identity))
    }
}
