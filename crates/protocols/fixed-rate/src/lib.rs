//! Fixed-Rate Protocol Implementation
//!
//! A claim series tokenizes a future claim on money-market collateral
//! (cTokens) that matures at an expiry block. Claim tokens trade against the
//! cToken in an AMM pair; the pair's reserves imply a fixed interest rate to
//! maturity.
//!
//! # Architecture
//!
//! Fetch and compute are separate steps:
//! - `fetch` reads one consistent `RawSnapshot` from the chain at a pinned block
//! - `scaling` converts raw fixed-point integers to plain numbers
//! - `calculator` derives prices, the implied APY, and wallet metrics as pure functions

pub mod calculator;
pub mod constants;
pub mod display;
pub mod fetch;
pub mod scaling;
pub mod state;

// Re-exports
pub use calculator::*;
pub use fetch::{fetch_market_pricing, fetch_next_expiry, fetch_raw_snapshot, MarketReader};
pub use scaling::{Fixed, Scale, TokenScales};
pub use state::*;
