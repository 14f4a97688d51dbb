//! Configuration types for fixrate

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, Error, Network};

/// Chain RPC connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC endpoint (e.g., "http://127.0.0.1:8545")
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// One fixed-rate market: a claim series over a money-market cToken,
/// traded against that cToken in an AMM pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Short identifier used in API paths (e.g., "cusdc")
    pub id: String,
    /// Display name
    pub name: String,
    /// Underlying asset symbol (e.g., "USDC")
    pub underlying_symbol: String,
    /// Interest-bearing collateral token
    pub ctoken: Address,
    /// Claim token series contract
    pub series: Address,
    /// AMM pair trading claim tokens against the cToken
    pub pair: Address,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Node connection settings
    pub node: NodeConfig,

    /// Network (mainnet or local)
    pub network: Network,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Overrides the network's blocks-per-year constant
    #[serde(default)]
    pub blocks_per_year: Option<f64>,

    /// Markets to serve
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
}

fn default_api_port() -> u16 {
    18545
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            network: Network::Local,
            api_port: default_api_port(),
            blocks_per_year: None,
            markets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check market ids are unique and addresses well-formed
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(bpy) = self.blocks_per_year {
            if !bpy.is_finite() || bpy <= 0.0 {
                return Err(Error::Config(format!(
                    "blocks_per_year must be positive, got {}",
                    bpy
                )));
            }
        }

        for (i, market) in self.markets.iter().enumerate() {
            if self.markets[..i].iter().any(|m| m.id == market.id) {
                return Err(Error::Config(format!("duplicate market id: {}", market.id)));
            }
            for addr in [&market.ctoken, &market.series, &market.pair] {
                Address::parse(addr.as_str())?;
            }
        }
        Ok(())
    }

    /// Blocks per year in effect (override or network constant)
    pub fn blocks_per_year(&self) -> f64 {
        self.blocks_per_year
            .unwrap_or_else(|| self.network.blocks_per_year())
    }

    pub fn market(&self, id: &str) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.id == id)
    }
}
