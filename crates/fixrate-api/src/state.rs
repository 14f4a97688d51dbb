//! Application state shared across API handlers

use std::sync::Arc;

use eth_node_client::NodeClient;
use fixrate_core::{AppConfig, MarketConfig, Network, NodeConfig};
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    node_client: RwLock<Option<NodeClient>>,
}

impl AppState {
    /// Create a new application state with default config
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                node_client: RwLock::new(None),
            }),
        }
    }

    /// Snapshot of the current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    pub async fn network(&self) -> Network {
        self.inner.config.read().await.network
    }

    pub async fn blocks_per_year(&self) -> f64 {
        self.inner.config.read().await.blocks_per_year()
    }

    pub async fn market(&self, id: &str) -> Option<MarketConfig> {
        self.inner.config.read().await.market(id).cloned()
    }

    /// Replace node settings and drop the cached client
    pub async fn set_node_config(&self, node_config: NodeConfig) {
        let mut config = self.inner.config.write().await;
        config.node = node_config;

        let mut client = self.inner.node_client.write().await;
        *client = None;
    }

    /// Get or create node client. `None` while the node is unreachable.
    pub async fn node_client(&self) -> Option<NodeClient> {
        {
            let client = self.inner.node_client.read().await;
            if client.is_some() {
                return client.clone();
            }
        }

        let node_config = self.inner.config.read().await.node.clone();
        tracing::info!(url = %node_config.url, "Connecting to node");

        match NodeClient::new(node_config.clone()).await {
            Ok(client) => {
                let mut cached = self.inner.node_client.write().await;
                *cached = Some(client.clone());
                Some(client)
            }
            Err(e) => {
                tracing::warn!(url = %node_config.url, error = %e, "Node connection failed");
                None
            }
        }
    }

    /// Drop the cached client and reconnect
    pub async fn refresh_node_client(&self) -> Option<NodeClient> {
        {
            let mut client = self.inner.node_client.write().await;
            *client = None;
        }

        self.node_client().await
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_node_config_updates_config() {
        let state = AppState::new();
        state
            .set_node_config(NodeConfig {
                url: "http://10.0.0.5:8545".to_string(),
                request_timeout_secs: 5,
            })
            .await;

        let config = state.config().await;
        assert_eq!(config.node.url, "http://10.0.0.5:8545");
        assert_eq!(config.node.request_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_blocks_per_year_override() {
        let config = AppConfig {
            blocks_per_year: Some(1_000_000.0),
            ..AppConfig::default()
        };
        let state = AppState::with_config(config);
        assert_eq!(state.blocks_per_year().await, 1_000_000.0);
        assert!(state.market("cusdc").await.is_none());
    }
}
