//! Node status and configuration endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use eth_node_client::NodeCapabilities;
use fixrate_core::{AppConfig, NodeConfig};

use crate::dto::{NodeConfigRequest, NodeStatusResponse};
use crate::AppState;

/// Create node routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/configure", post(configure))
}

/// GET /node/status
pub async fn get_status(State(state): State<AppState>) -> Json<NodeStatusResponse> {
    let caps = match state.node_client().await {
        Some(client) => client.capabilities().await,
        None => None,
    };

    Json(status_response(&state.config().await, caps))
}

/// POST /node/configure - Point at a different node and reconnect
pub async fn configure(
    State(state): State<AppState>,
    Json(request): Json<NodeConfigRequest>,
) -> Json<NodeStatusResponse> {
    let defaults = NodeConfig::default();
    let node_config = NodeConfig {
        url: request.url,
        request_timeout_secs: request
            .request_timeout_secs
            .unwrap_or(defaults.request_timeout_secs),
    };
    state.set_node_config(node_config).await;

    // Report on the client just built; an unreachable node is not retried
    let caps = match state.refresh_node_client().await {
        Some(client) => client.capabilities().await,
        None => None,
    };

    Json(status_response(&state.config().await, caps))
}

fn status_response(config: &AppConfig, caps: Option<NodeCapabilities>) -> NodeStatusResponse {
    let network = config.network;
    let url = config.node.url.clone();

    match caps {
        Some(caps) => NodeStatusResponse {
            connected: caps.is_online,
            url,
            network: network.as_str().to_string(),
            network_matches: caps.matches_network(network),
            chain_id: caps.chain_id,
            chain_height: caps.chain_height,
            is_syncing: caps.is_syncing,
            client_version: caps.client_version,
        },
        None => NodeStatusResponse {
            connected: false,
            url,
            network: network.as_str().to_string(),
            network_matches: false,
            chain_id: None,
            chain_height: 0,
            is_syncing: false,
            client_version: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixrate_core::Network;

    fn caps(chain_id: Option<u64>) -> NodeCapabilities {
        NodeCapabilities {
            is_online: true,
            chain_id,
            chain_height: 14_000_000,
            is_syncing: true,
            client_version: Some("Geth/v1.13.5".to_string()),
        }
    }

    #[test]
    fn test_status_from_capabilities() {
        let config = AppConfig {
            network: Network::Mainnet,
            ..AppConfig::default()
        };

        let status = status_response(&config, Some(caps(Some(1))));
        assert!(status.connected);
        assert!(status.network_matches);
        assert!(status.is_syncing);
        assert_eq!(status.network, "mainnet");
        assert_eq!(status.chain_height, 14_000_000);
        assert_eq!(status.client_version.as_deref(), Some("Geth/v1.13.5"));

        let wrong_chain = status_response(&config, Some(caps(Some(5))));
        assert!(wrong_chain.connected);
        assert!(!wrong_chain.network_matches);
    }

    #[test]
    fn test_status_without_client() {
        let config = AppConfig::default();
        let status = status_response(&config, None);
        assert!(!status.connected);
        assert!(!status.network_matches);
        assert_eq!(status.url, config.node.url);
        assert_eq!(status.chain_id, None);
    }

    #[tokio::test]
    async fn test_configure_reports_unreachable_node() {
        let state = AppState::new();
        let request = NodeConfigRequest {
            url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: Some(1),
        };

        let started = std::time::Instant::now();
        let Json(status) = configure(State(state.clone()), Json(request)).await;
        assert!(!status.connected);
        assert_eq!(status.url, "http://127.0.0.1:1");
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(state.config().await.node.request_timeout_secs, 1);
    }
}
