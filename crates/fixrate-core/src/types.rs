//! Core type definitions for fixrate

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

/// Ethereum account or contract address (20 bytes, `0x`-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Parse and normalize an address. Accepts mixed case, stores lowercase.
    pub fn parse(addr: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidAddress {
            address: addr.to_string(),
        };

        let body = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .ok_or_else(invalid)?;

        if body.len() != 40 {
            return Err(invalid());
        }
        hex::decode(body).map_err(|_| invalid())?;

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 20 address bytes. Returns `None` for malformed addresses.
    pub fn to_bytes(&self) -> Option<[u8; 20]> {
        let body = self.0.strip_prefix("0x")?;
        let bytes = hex::decode(body).ok()?;
        bytes.try_into().ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    /// Local development chain (mainnet fork)
    Local,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Local => "local",
        }
    }

    /// Expected EIP-155 chain id. Local dev chains vary, so any id is accepted.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Mainnet => Some(1),
            Self::Local => None,
        }
    }

    /// Blocks mined per year on this chain.
    ///
    /// The local chain is a mainnet fork, so it shares the mainnet constant.
    pub fn blocks_per_year(&self) -> f64 {
        match self {
            Self::Mainnet | Self::Local => constants::BLOCKS_PER_YEAR,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Block height
pub type BlockHeight = u64;

/// Constants
pub mod constants {
    /// Mainnet blocks per year (~13.13s block time)
    pub const BLOCKS_PER_YEAR: f64 = 2_402_432.0;

    /// Seconds in a 365-day year
    pub const SECONDS_PER_YEAR: u64 = 31_536_000;

    /// Days in a year used for compounding
    pub const DAYS_PER_YEAR: u32 = 365;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_normalizes_case() {
        let addr = Address::parse("0x08076ef44737edC609E1dDbb05cfe142cA1ceF17").unwrap();
        assert_eq!(addr.as_str(), "0x08076ef44737edc609e1ddbb05cfe142ca1cef17");
        assert_eq!(addr.to_bytes().unwrap()[0], 0x08);
    }

    #[test]
    fn test_address_parse_rejects_malformed() {
        assert!(Address::parse("08076ef44737edC609E1dDbb05cfe142cA1ceF17").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzz076ef44737edC609E1dDbb05cfe142cA1ceF17").is_err());
    }

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Local.as_str(), "local");
        assert_eq!(Network::Mainnet.blocks_per_year(), 2_402_432.0);
        assert_eq!(Network::Mainnet.chain_id(), Some(1));
        assert_eq!(Network::Local.chain_id(), None);
    }
}
