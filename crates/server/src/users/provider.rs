use super::{HttpUserStore, UserStore};
use crate::config::{SharedConfig, UserClientConfig};
use crate::error::ProviderError;
use crate::transport::{self, HttpsClient};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves a store name to a client bound to that store.
pub trait UserStoreProvider: Send + Sync {
    fn create_client(&self, store: &str) -> Result<Arc<dyn UserStore>, ProviderError>;
}

struct Channel {
    options: UserClientConfig,
    http: HttpsClient,
}

/// Provider owning one pooled transport channel per configured store.
///
/// A channel is reused while the store's settings are unchanged and rebuilt
/// after a configuration reload alters them. Dropping the provider releases
/// every channel it created.
pub struct ChannelProvider {
    config: SharedConfig,
    channels: DashMap<String, Channel>,
}

impl ChannelProvider {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            channels: DashMap::new(),
        }
    }

    /// Number of live transport channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn channel_for(&self, store: &str, options: &UserClientConfig) -> Result<HttpsClient, ProviderError> {
        if let Some(channel) = self.channels.get(store)
            && channel.options == *options
        {
            return Ok(channel.http.clone());
        }

        debug!(store, address = %options.address, "Opening user store channel");
        let tls = transport::tls_config(options.ca_certificate_path.as_deref()).map_err(|e| {
            ProviderError::Tls {
                store: store.to_string(),
                reason: e.to_string(),
            }
        })?;
        let http = transport::build_client(tls);
        self.channels.insert(
            store.to_string(),
            Channel {
                options: options.clone(),
                http: http.clone(),
            },
        );
        Ok(http)
    }
}

impl UserStoreProvider for ChannelProvider {
    fn create_client(&self, store: &str) -> Result<Arc<dyn UserStore>, ProviderError> {
        if store.trim().is_empty() {
            return Err(ProviderError::MissingStore);
        }
        let config = self.config.snapshot();
        let (name, options) = config
            .users
            .resolve(store)
            .ok_or_else(|| ProviderError::UnsupportedStore(store.to_string()))?;

        let http = self.channel_for(name, options)?;
        Ok(Arc::new(HttpUserStore::new(name, options.clone(), http)))
    }
}

impl Drop for ChannelProvider {
    fn drop(&mut self) {
        let count = self.channels.len();
        self.channels.clear();
        debug!(count, "Released user store channels");
    }
}
