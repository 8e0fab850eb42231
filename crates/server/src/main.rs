use login_consent_provider::api::start_webserver;
use login_consent_provider::config::{SharedConfig, load_config};
use login_consent_provider::hydra::HydraClient;
use login_consent_provider::revocation;
use login_consent_provider::users::ChannelProvider;
use login_consent_provider::{AppState, SystemClock};
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_standard_tracing() {
    let default_directives = "login_consent_provider=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

/// Re-reads the configuration file on SIGHUP. A broken file keeps the current settings.
#[cfg(unix)]
fn spawn_reload_on_sighup(config: SharedConfig) -> color_eyre::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            match config.reload() {
                Ok(()) => tracing::info!("Configuration reloaded"),
                Err(e) => tracing::error!("Configuration reload failed, keeping the current settings: {e}"),
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_reload_on_sighup(_config: SharedConfig) -> color_eyre::Result<()> {
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    initialize_standard_tracing();

    // Load config
    let config = load_config()?;

    CryptoProvider::install_default(crypto::ring::default_provider())
        .map_err(|_| color_eyre::eyre::eyre!("Failed to install crypto provider"))?;

    let hydra = Arc::new(HydraClient::new(&config.hydra)?);
    let revocations = revocation::open(&config.revocation).await?;
    tracing::info!(
        backend = ?config.revocation.backend,
        stores = config.users.clients.len(),
        show_debug = config.auth.show_debug,
        "configuration loaded"
    );

    let config = SharedConfig::new(config);
    spawn_reload_on_sighup(config.clone())?;

    let state = AppState {
        stores: Arc::new(ChannelProvider::new(config.clone())),
        config,
        hydra,
        revocations,
        clock: Arc::new(SystemClock),
    };

    start_webserver(state).await
}
