//! eth-node-client: web3 client for an Ethereum node
//!
//! This crate provides a small client for reading contract state: block
//! height, chain id, and view calls against a pinned block, with capability
//! probing and per-request timeouts.

pub mod capabilities;
pub mod contracts;
pub mod queries;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fixrate_core::{Address, BlockHeight, NodeConfig, NodeError};
use tokio::sync::RwLock;
use web3::contract::tokens::{Detokenize, Tokenize};
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::SyncState;
use web3::Web3;

pub use capabilities::NodeCapabilities;
pub use contracts::Abi;

/// Result type for node client operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Ethereum node client with capability detection
#[derive(Clone)]
pub struct NodeClient {
    web3: Web3<Http>,
    config: NodeConfig,
    capabilities: Arc<RwLock<Option<NodeCapabilities>>>,
}

impl NodeClient {
    /// Create a new client and check the node responds
    pub async fn new(config: NodeConfig) -> Result<Self> {
        let client = Self::new_unconnected(config)?;

        if !client.is_online().await {
            return Err(NodeError::Unreachable {
                url: client.config.url.clone(),
            });
        }

        client.refresh_capabilities().await;
        Ok(client)
    }

    /// Create without contacting the node (for testing or when it may be offline)
    pub fn new_unconnected(config: NodeConfig) -> Result<Self> {
        let transport = Http::new(&config.url).map_err(|e| NodeError::Unreachable {
            url: format!("{}: {}", config.url, e),
        })?;

        Ok(Self {
            web3: Web3::new(transport),
            config,
            capabilities: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the current node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Refresh capability detection
    pub async fn refresh_capabilities(&self) {
        let caps = capabilities::detect_capabilities(self).await;
        let mut lock = self.capabilities.write().await;
        *lock = Some(caps);
    }

    /// Get current capabilities (may be stale if not recently refreshed)
    pub async fn capabilities(&self) -> Option<NodeCapabilities> {
        let lock = self.capabilities.read().await;
        lock.clone()
    }

    /// Current block height
    pub async fn block_number(&self) -> Result<BlockHeight> {
        let height = self
            .timed(self.web3.eth().block_number(), |e| map_web3_error(&self.config.url, e))
            .await?;
        Ok(height.as_u64())
    }

    /// EIP-155 chain id
    pub async fn chain_id(&self) -> Result<u64> {
        let id = self
            .timed(self.web3.eth().chain_id(), |e| map_web3_error(&self.config.url, e))
            .await?;
        contracts::to_u64(id, "chain id")
    }

    /// Node software version string
    pub async fn client_version(&self) -> Option<String> {
        self.timed(self.web3.web3().client_version(), |e| {
            map_web3_error(&self.config.url, e)
        })
        .await
        .ok()
    }

    /// Whether the node reports an in-progress sync
    pub async fn is_syncing(&self) -> Result<bool> {
        let state = self
            .timed(self.web3.eth().syncing(), |e| map_web3_error(&self.config.url, e))
            .await?;
        Ok(matches!(state, SyncState::Syncing(_)))
    }

    /// Check if node is online
    pub async fn is_online(&self) -> bool {
        self.block_number().await.is_ok()
    }

    /// Evaluate a view function of `contract` at `block`
    pub async fn query<R, P>(
        &self,
        abi: Abi,
        contract: &Address,
        method: &str,
        params: P,
        block: BlockHeight,
    ) -> Result<R>
    where
        R: Detokenize,
        P: Tokenize,
    {
        let address = contracts::to_h160(contract)?;
        let instance = Contract::from_json(self.web3.eth(), address, abi.json())
            .map_err(|e| NodeError::ParseError(format!("{} ABI: {}", abi.name(), e)))?;

        let call = instance.query(
            method,
            params,
            None,
            Options::default(),
            contracts::at_block(block),
        );

        self.timed(call, |e| map_contract_error(&self.config.url, e))
            .await
            .map_err(|e| {
                tracing::warn!(contract = %contract, method, block, error = %e, "Contract query failed");
                e
            })
    }

    async fn timed<T, E>(
        &self,
        fut: impl Future<Output = std::result::Result<T, E>>,
        map_err: impl FnOnce(E) -> NodeError,
    ) -> Result<T> {
        let secs = self.config.request_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| NodeError::Timeout { secs })?
            .map_err(map_err)
    }
}

fn map_web3_error(url: &str, e: web3::Error) -> NodeError {
    match e {
        web3::Error::Unreachable | web3::Error::Transport(_) | web3::Error::Io(_) => {
            NodeError::Unreachable {
                url: format!("{}: {}", url, e),
            }
        }
        web3::Error::Rpc(err) => NodeError::RpcError {
            code: err.code.code(),
            message: err.message,
        },
        other => NodeError::ParseError(other.to_string()),
    }
}

fn map_contract_error(url: &str, e: web3::contract::Error) -> NodeError {
    match e {
        web3::contract::Error::Api(inner) => map_web3_error(url, inner),
        other => NodeError::ParseError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3::error::TransportError;

    const URL: &str = "http://127.0.0.1:8545";

    #[test]
    fn test_transport_errors_are_unreachable() {
        let e = map_web3_error(URL, web3::Error::Transport(TransportError::Code(502)));
        assert!(matches!(e, NodeError::Unreachable { ref url } if url.starts_with(URL)));

        assert!(matches!(
            map_web3_error(URL, web3::Error::Unreachable),
            NodeError::Unreachable { .. }
        ));
    }

    #[test]
    fn test_rpc_error_keeps_code() {
        let err = web3::Error::Rpc(jsonrpc_core::Error {
            code: jsonrpc_core::ErrorCode::ServerError(-32000),
            message: "execution reverted".to_string(),
            data: None,
        });
        match map_web3_error(URL, err) {
            NodeError::RpcError { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "execution reverted");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_errors_are_parse_errors() {
        assert!(matches!(
            map_web3_error(URL, web3::Error::Decoder("bad hex".to_string())),
            NodeError::ParseError(_)
        ));
        assert!(matches!(
            map_contract_error(URL, web3::contract::Error::InvalidOutputType("u256".to_string())),
            NodeError::ParseError(_)
        ));
        assert!(matches!(
            map_contract_error(URL, web3::contract::Error::Api(web3::Error::Unreachable)),
            NodeError::Unreachable { .. }
        ));
    }

    #[test]
    fn test_client_without_connecting() {
        let client = NodeClient::new_unconnected(NodeConfig::default()).unwrap();
        assert_eq!(client.config().url, URL);
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let config = NodeConfig {
            url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 1,
        };
        let client = NodeClient::new_unconnected(config.clone()).unwrap();
        assert!(!client.is_online().await);
        assert!(NodeClient::new(config).await.is_err());
    }
}
