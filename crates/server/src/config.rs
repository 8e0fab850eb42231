use arc_swap::ArcSwap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Connection settings for the authorization server.
#[derive(Clone, Deserialize)]
pub struct HydraConfig {
    /// Base URL of the admin API, including any path prefix (e.g. `/admin`).
    pub admin_url: String,
    /// Base URL of the public API (issuer, discovery, JWKS).
    pub public_url: String,
    /// Sent as `Authorization: ApiKey <key>` on admin calls when set.
    #[serde(default)]
    pub admin_api_key: Option<String>,
    /// Extra PEM bundle trusted on top of the webpki roots.
    #[serde(default)]
    pub ca_certificate_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Endpoint and transport-trust parameters of one user store.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserClientConfig {
    pub address: String,
    #[serde(default)]
    pub ca_certificate_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UsersConfig {
    #[serde(default)]
    pub clients: HashMap<String, UserClientConfig>,
}

impl UsersConfig {
    /// Resolves a store name to its settings.
    ///
    /// An exact match wins; otherwise the lookup falls back to an ASCII
    /// case-insensitive comparison, picking the lexicographically smallest
    /// configured name so the result never depends on map iteration order.
    pub fn find(&self, store: &str) -> Option<&UserClientConfig> {
        self.resolve(store).map(|(_, client)| client)
    }

    /// Like [`UsersConfig::find`], also returning the configured name that matched.
    pub fn resolve(&self, store: &str) -> Option<(&str, &UserClientConfig)> {
        if let Some((name, client)) = self.clients.get_key_value(store) {
            return Some((name.as_str(), client));
        }
        self.clients
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(store))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(name, client)| (name.as_str(), client))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    /// Attach `error_debug` to error redirects and reject bodies.
    #[serde(default)]
    pub show_debug: bool,
    /// How long the authorization server remembers a login or consent.
    #[serde(default = "default_remember_for")]
    pub remember_for_seconds: i64,
    /// Scope name to the claim names released for it.
    #[serde(default)]
    pub scopes: HashMap<String, Vec<String>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            show_debug: false,
            remember_for_seconds: default_remember_for(),
            scopes: HashMap::new(),
        }
    }
}

impl AuthConfig {
    /// Claim names released for the requested scopes, in request order, without duplicates.
    /// Scopes missing from the mapping contribute nothing.
    pub fn claims_for_scopes(&self, requested: &[String]) -> Vec<String> {
        let mut claims: Vec<String> = Vec::new();
        for scope in requested {
            let Some(names) = self.scopes.get(scope) else {
                continue;
            };
            for name in names {
                if !claims.contains(name) {
                    claims.push(name.clone());
                }
            }
        }
        claims
    }
}

/// Relying-party settings used to validate back-channel logout tokens.
#[derive(Clone, Debug, Deserialize)]
pub struct BackchannelConfig {
    pub client_id: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationBackend {
    /// Per-process; only correct for a single instance.
    #[default]
    Memory,
    Database,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RevocationConfig {
    #[serde(default)]
    pub backend: RevocationBackend,
    #[serde(default)]
    pub database_url: Option<String>,
}

/// User-facing message catalog.
#[derive(Clone, Debug, Deserialize)]
pub struct MessagesConfig {
    /// Shown for unexpected failures and as fallback for unknown rejection codes.
    #[serde(default = "default_authentication_failure")]
    pub authentication_failure: String,
    /// Store name to backend error code to message.
    #[serde(default)]
    pub stores: HashMap<String, HashMap<String, String>>,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            authentication_failure: default_authentication_failure(),
            stores: HashMap::new(),
        }
    }
}

impl MessagesConfig {
    /// Message for an explicit rejection by `store` with `code`, falling back to the generic one.
    pub fn authentication_failure(&self, store: &str, code: &str) -> &str {
        self.store_messages(store)
            .and_then(|codes| {
                codes.get(code).or_else(|| {
                    codes
                        .iter()
                        .filter(|(known, _)| known.eq_ignore_ascii_case(code))
                        .min_by(|(a, _), (b, _)| a.cmp(b))
                        .map(|(_, message)| message)
                })
            })
            .map(String::as_str)
            .unwrap_or(&self.authentication_failure)
    }

    fn store_messages(&self, store: &str) -> Option<&HashMap<String, String>> {
        if let Some(codes) = self.stores.get(store) {
            return Some(codes);
        }
        self.stores
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(store))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, codes)| codes)
    }
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub hydra: HydraConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub backchannel: BackchannelConfig,
    #[serde(default)]
    pub revocation: RevocationConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("hydra.admin_url", &self.hydra.admin_url),
            ("hydra.public_url", &self.hydra.public_url),
        ] {
            Url::parse(url)
                .map_err(|e| ConfigError::Validation(format!("{name} is not a valid URL: {e}")))?;
        }
        if self.backchannel.client_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backchannel.client_id must not be empty".into(),
            ));
        }
        if self.auth.remember_for_seconds < 0 {
            return Err(ConfigError::Validation(
                "auth.remember_for_seconds must be >= 0".into(),
            ));
        }
        for (store, client) in &self.users.clients {
            if store.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "users.clients contains an empty store name".into(),
                ));
            }
            Url::parse(&client.address).map_err(|e| {
                ConfigError::Validation(format!(
                    "users.clients.{store}.address is not a valid URL: {e}"
                ))
            })?;
            if client.timeout_secs == 0 {
                return Err(ConfigError::Validation(format!(
                    "users.clients.{store}.timeout_secs must be > 0"
                )));
            }
        }
        if self.hydra.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "hydra.timeout_secs must be > 0".into(),
            ));
        }
        if self.revocation.backend == RevocationBackend::Database
            && self
                .revocation
                .database_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "revocation.database_url is required for the database backend".into(),
            ));
        }
        Ok(())
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_remember_for() -> i64 {
    3600
}

fn default_authentication_failure() -> String {
    "Authentication failed. Please try again.".to_string()
}

/// Path of the configuration file, `CONFIG_PATH` or `config.yaml`.
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string())
}

/// Load application configuration from the configuration file + environment overrides.
///
/// Any environment variable matching the key path separated by double underscores
/// (e.g. `AUTH__SHOW_DEBUG`) overrides the file value.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Hot-swappable configuration.
///
/// Handlers take one [`SharedConfig::snapshot`] per request and use it for the
/// whole request, so a reload never changes settings mid-flow.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<AppConfig>>,
}

impl SharedConfig {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<AppConfig> {
        self.inner.load_full()
    }

    pub fn replace(&self, config: AppConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Re-read the configuration file; the current snapshot stays in place on error.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let config = load_config()?;
        self.replace(config);
        Ok(())
    }
}
