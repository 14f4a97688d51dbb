//! Fixed-Rate Constants
//!
//! Token decimals, fixed-point scales, and display thresholds.

/// Decimal places of each on-chain quantity
pub mod decimals {
    /// USDC underlying
    pub const USDC: u8 = 6;
    /// cUSDC collateral token
    pub const CUSDC: u8 = 8;
    /// Claim tokens are minted 1:1 against supplied cToken units
    pub const CLAIM: u8 = 8;
    /// cToken exchange rate: 18 + underlying decimals - cToken decimals
    pub const EXCHANGE_RATE: u8 = 16;
    /// Series collateral factor
    pub const COLLATERAL_FACTOR: u8 = 18;
    /// Money-market supply rate per block
    pub const SUPPLY_RATE: u8 = 18;
}

/// Named scales built from `decimals`
pub mod scales {
    use super::decimals;
    use crate::scaling::Scale;

    pub const USDC: Scale = Scale::new(decimals::USDC);
    pub const CUSDC: Scale = Scale::new(decimals::CUSDC);
    pub const CLAIM: Scale = Scale::new(decimals::CLAIM);
    pub const EXCHANGE_RATE: Scale = Scale::new(decimals::EXCHANGE_RATE);
    pub const COLLATERAL_FACTOR: Scale = Scale::new(decimals::COLLATERAL_FACTOR);
    pub const SUPPLY_RATE: Scale = Scale::new(decimals::SUPPLY_RATE);
}

/// |APY| above this is flagged as extreme (1000%)
pub const EXTREME_APY: f64 = 10.0;

/// Default lookahead for the next expiry series, in blocks
pub const DEFAULT_EXPIRY_LOOKAHEAD_BLOCKS: u64 = 512;

/// Decimal places shown for exchange rates
pub const RATE_DISPLAY_DECIMALS: usize = 4;

/// Decimal places shown for percentages
pub const PCT_DISPLAY_DECIMALS: usize = 2;
