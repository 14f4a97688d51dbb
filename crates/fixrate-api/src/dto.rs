//! Data Transfer Objects for API requests and responses

use fixed_rate::{RawSnapshot, TokenScales};
use fixrate_core::{Address, MarketConfig, ProtocolError};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Node status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusResponse {
    pub connected: bool,
    pub url: String,
    pub network: String,
    pub chain_id: Option<u64>,
    pub chain_height: u64,
    pub is_syncing: bool,
    pub client_version: Option<String>,
    /// Node chain id agrees with the configured network
    pub network_matches: bool,
}

/// Node configuration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigRequest {
    pub url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Configured market, as listed by `GET /fixed-rate/markets`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub id: String,
    pub name: String,
    pub underlying_symbol: String,
    pub ctoken: Address,
    pub series: Address,
    pub pair: Address,
}

impl From<&MarketConfig> for MarketSummary {
    fn from(m: &MarketConfig) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            underlying_symbol: m.underlying_symbol.clone(),
            ctoken: m.ctoken.clone(),
            series: m.series.clone(),
            pair: m.pair.clone(),
        }
    }
}

/// Query for `GET /fixed-rate/markets/:id/pricing`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingQuery {
    /// Wallet to value (0x-prefixed)
    pub wallet: Option<String>,
}

/// Query for `GET /fixed-rate/markets/:id/next-expiry`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextExpiryQuery {
    pub min_blocks: Option<u64>,
}

/// Price a caller-supplied snapshot without touching the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub raw: RawSnapshot,
    /// Defaults to the cUSDC market scales
    #[serde(default)]
    pub scales: TokenScales,
    /// Defaults to the configured network value
    #[serde(default)]
    pub blocks_per_year: Option<f64>,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn node_unavailable(message: impl Into<String>) -> Self {
        Self::new("node_unavailable", message)
    }
}

impl From<&ProtocolError> for ApiError {
    fn from(e: &ProtocolError) -> Self {
        Self::new(e.error_code(), e.to_string())
    }
}
