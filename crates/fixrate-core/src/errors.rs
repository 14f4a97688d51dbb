//! Error types for fixrate

use thiserror::Error;

/// Core errors that can occur in fixrate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Chain RPC connection and query errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Node unreachable at {url}")]
    Unreachable { url: String },

    #[error("Node returned error {code}: {message}")]
    RpcError { code: i64, message: String },

    #[error("Node request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Market not found: {id}")]
    MarketNotFound { id: String },

    #[error("Protocol state unavailable: {reason}")]
    StateUnavailable { reason: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Degenerate market state: {reason}")]
    DegenerateMarket { reason: String },

    #[error("Failed to decode contract data: {message}")]
    DecodeError { message: String },
}

/// Result type alias for fixrate operations
pub type Result<T> = std::result::Result<T, Error>;

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MarketNotFound { .. } => "market_not_found",
            Self::StateUnavailable { .. } => "state_unavailable",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::DegenerateMarket { .. } => "degenerate_market",
            Self::DecodeError { .. } => "decode_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidAddress { .. } => 400,
            Self::MarketNotFound { .. } => 404,
            Self::DegenerateMarket { .. } => 422,
            Self::StateUnavailable { .. } | Self::DecodeError { .. } => 503,
        }
    }
}
