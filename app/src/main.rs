//! fixrate: serve fixed-rate market pricing over HTTP
//!
//! Usage: `fixrate [config.json]`. Without an argument the path is taken from
//! `FIXRATE_CONFIG`; without either, local-chain defaults are used.

use anyhow::Context;
use fixrate_api::{start_server, AppState};
use fixrate_core::AppConfig;

const CONFIG_ENV: &str = "FIXRATE_CONFIG";

fn load_config() -> anyhow::Result<AppConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());

    match path {
        Some(path) => {
            let config = AppConfig::load(&path)
                .with_context(|| format!("loading config from {}", path))?;
            tracing::info!(%path, markets = config.markets.len(), "Loaded config");
            Ok(config)
        }
        None => {
            tracing::warn!("No config file given, using local defaults with no markets");
            Ok(AppConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fixrate=debug".parse()?)
                .add_directive("fixed_rate=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let config = load_config()?;
    let port = config.api_port;
    let network = config.network;
    let state = AppState::with_config(config);

    match state.node_client().await {
        Some(client) => match client.capabilities().await {
            Some(caps) if !caps.matches_network(network) => tracing::warn!(
                chain_id = ?caps.chain_id,
                %network,
                "Node chain id does not match configured network"
            ),
            Some(caps) => tracing::info!(
                height = caps.chain_height,
                version = caps.client_version.as_deref().unwrap_or("unknown"),
                "Node connected"
            ),
            None => {}
        },
        None => tracing::warn!("Node unreachable, pricing endpoints will return 503 until it is"),
    }

    start_server(state, port)
        .await
        .context("API server failed")?;

    Ok(())
}
