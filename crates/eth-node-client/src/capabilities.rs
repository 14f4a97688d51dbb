//! Node capability detection
//!
//! Queries chain id, block height, and sync status.

use fixrate_core::{BlockHeight, Network};
use serde::{Deserialize, Serialize};

use crate::NodeClient;

/// Node capabilities detected through probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCapabilities {
    /// Node is reachable and responding
    pub is_online: bool,

    /// EIP-155 chain id
    pub chain_id: Option<u64>,

    /// Current chain height
    pub chain_height: BlockHeight,

    /// Node reports an in-progress sync
    pub is_syncing: bool,

    /// Node software version
    pub client_version: Option<String>,
}

impl NodeCapabilities {
    fn offline() -> Self {
        Self {
            is_online: false,
            chain_id: None,
            chain_height: 0,
            is_syncing: false,
            client_version: None,
        }
    }

    /// Check the node serves the configured network
    pub fn matches_network(&self, network: Network) -> bool {
        match (network.chain_id(), self.chain_id) {
            (None, _) => true,
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
        }
    }
}

/// Detect node capabilities by probing endpoints
pub async fn detect_capabilities(client: &NodeClient) -> NodeCapabilities {
    let chain_height = match client.block_number().await {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(url = %client.config().url, error = %e, "Node capability check failed");
            return NodeCapabilities::offline();
        }
    };

    let (chain_id, is_syncing, client_version) = tokio::join!(
        client.chain_id(),
        client.is_syncing(),
        client.client_version()
    );

    NodeCapabilities {
        is_online: true,
        chain_id: chain_id.ok(),
        chain_height,
        is_syncing: is_syncing.unwrap_or(false),
        client_version,
    }
}
