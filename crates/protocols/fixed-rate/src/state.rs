//! Fixed-Rate State Types
//!
//! Snapshots, pricing metrics, API-facing market state, and errors.

use std::fmt;

use fixrate_core::{Address, BlockHeight, MarketConfig, ProtocolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculator::{estimate_seconds_to_maturity, price_snapshot, variable_supply_apy};
use crate::display::pricing_display;
use crate::scaling::TokenScales;

/// Formula that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    SpotPrice,
    ImpliedMaturityRate,
    ImpliedFixedApy,
    WalletValuation,
    HedgeRatio,
    VariableSupplyApy,
    MaturityEstimate,
}

impl Formula {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpotPrice => "spot price",
            Self::ImpliedMaturityRate => "implied maturity rate",
            Self::ImpliedFixedApy => "implied fixed APY",
            Self::WalletValuation => "wallet valuation",
            Self::HedgeRatio => "hedge ratio",
            Self::VariableSupplyApy => "variable supply APY",
            Self::MaturityEstimate => "maturity estimate",
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pricing calculator errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Division by zero in {formula}: {denominator} is zero")]
    DivisionByZero {
        formula: Formula,
        denominator: &'static str,
    },

    #[error("Invalid input {field}: {value}")]
    InvalidInput { field: &'static str, value: f64 },

    /// Finite inputs produced an infinite or NaN result
    #[error("Non-finite result in {formula}")]
    Overflow { formula: Formula },
}

impl From<PricingError> for ProtocolError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::DivisionByZero { .. } | PricingError::Overflow { .. } => {
                ProtocolError::DegenerateMarket {
                    reason: e.to_string(),
                }
            }
            PricingError::InvalidInput { .. } => ProtocolError::InvalidAmount {
                message: e.to_string(),
            },
        }
    }
}

/// Integer readings exactly as returned by the contracts, all taken at
/// `block_height`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub block_height: BlockHeight,
    /// AMM claim token reserve (claim base units)
    pub claim_reserve: u128,
    /// AMM cToken reserve (cToken base units)
    pub collateral_reserve: u128,
    /// Series floor exchange rate (1e16)
    pub min_exchange_rate: u128,
    /// cToken exchange rate (1e16)
    pub current_exchange_rate: u128,
    /// Series collateral factor (1e18)
    pub collateral_factor: u128,
    /// Money-market supply rate per block (1e18)
    #[serde(default)]
    pub supply_rate_per_block: u128,
    pub blocks_to_expiry: u64,
    #[serde(default)]
    pub wallet_ctoken_balance: u128,
    #[serde(default)]
    pub wallet_claim_balance: u128,
}

/// De-scaled calculator input for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    pub claim_reserve: f64,
    pub collateral_reserve: f64,
    pub min_exchange_rate: f64,
    pub current_exchange_rate: f64,
    /// Normalized (0.10 = 10%)
    pub collateral_factor: f64,
    pub blocks_to_expiry: u64,
    pub blocks_per_year: f64,
    pub wallet_ctoken_balance: f64,
    pub wallet_claim_balance: f64,
}

impl PricingInput {
    /// Reject negative or non-finite fields
    pub fn validate(&self) -> Result<(), PricingError> {
        let fields = [
            ("claim_reserve", self.claim_reserve),
            ("collateral_reserve", self.collateral_reserve),
            ("min_exchange_rate", self.min_exchange_rate),
            ("current_exchange_rate", self.current_exchange_rate),
            ("collateral_factor", self.collateral_factor),
            ("blocks_per_year", self.blocks_per_year),
            ("wallet_ctoken_balance", self.wallet_ctoken_balance),
            ("wallet_claim_balance", self.wallet_claim_balance),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PricingError::InvalidInput { field, value });
            }
        }
        Ok(())
    }

    pub fn has_wallet_position(&self) -> bool {
        self.wallet_ctoken_balance > 0.0 || self.wallet_claim_balance > 0.0
    }
}

/// Wallet value under current pricing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletValuation {
    /// cToken units
    pub value_in_collateral_units: f64,
    /// Underlying units at the current exchange rate
    pub value_in_underlying_units: f64,
    /// Underlying units at the implied maturity exchange rate
    pub value_at_maturity: f64,
}

/// Classification of an implied APY. Values are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApyFlag {
    Normal,
    /// AMM implies a rate below the current exchange rate
    Negative,
    /// |APY| above `EXTREME_APY`, typically near-empty reserves or imminent expiry
    Extreme,
}

/// Every metric derived from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingMetrics {
    pub spot_price: f64,
    pub implied_maturity_rate: f64,
    pub implied_fixed_apy: f64,
    pub apy_flag: ApyFlag,
    pub wallet: WalletValuation,
    /// `None` when the wallet holds neither token
    pub hedge_ratio: Option<f64>,
}

/// Market pricing state for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPricingState {
    pub market_id: String,
    pub market_name: String,
    pub underlying_symbol: String,
    pub block_height: BlockHeight,
    pub wallet: Option<Address>,

    pub raw: RawSnapshot,
    pub input: PricingInput,
    pub metrics: PricingMetrics,

    // Variable-rate comparison
    pub variable_supply_apy: f64,
    pub fixed_minus_variable: f64,

    // Maturity estimate
    pub seconds_to_maturity: u64,
    pub estimated_maturity_unix: u64,

    // Display strings
    pub display: PricingDisplay,
}

impl MarketPricingState {
    /// Price a raw snapshot for a market.
    ///
    /// `now_unix` anchors the maturity estimate.
    pub fn from_snapshot(
        market: &MarketConfig,
        wallet: Option<Address>,
        raw: RawSnapshot,
        scales: &TokenScales,
        blocks_per_year: f64,
        now_unix: u64,
    ) -> Result<Self, PricingError> {
        let quote = SnapshotQuote::price(&raw, scales, blocks_per_year)?;

        Ok(Self {
            market_id: market.id.clone(),
            market_name: market.name.clone(),
            underlying_symbol: market.underlying_symbol.clone(),
            block_height: raw.block_height,
            wallet,
            variable_supply_apy: quote.variable_supply_apy,
            fixed_minus_variable: quote.fixed_minus_variable,
            seconds_to_maturity: quote.seconds_to_maturity,
            estimated_maturity_unix: now_unix.saturating_add(quote.seconds_to_maturity),
            raw,
            input: quote.input,
            metrics: quote.metrics,
            display: quote.display,
        })
    }
}

/// Pricing of a bare snapshot, without market metadata or wall-clock time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuote {
    pub block_height: BlockHeight,
    pub input: PricingInput,
    pub metrics: PricingMetrics,
    pub variable_supply_apy: f64,
    pub fixed_minus_variable: f64,
    pub seconds_to_maturity: u64,
    pub display: PricingDisplay,
}

impl SnapshotQuote {
    pub fn price(
        raw: &RawSnapshot,
        scales: &TokenScales,
        blocks_per_year: f64,
    ) -> Result<Self, PricingError> {
        let input = raw.descale(scales, blocks_per_year);
        let metrics = price_snapshot(&input)?;

        let supply_rate = scales.supply_rate.descale(raw.supply_rate_per_block).value();
        let variable_apy = variable_supply_apy(supply_rate, blocks_per_year)?;
        let seconds_to_maturity =
            estimate_seconds_to_maturity(raw.blocks_to_expiry, blocks_per_year)?;
        let display = pricing_display(&input, &metrics, variable_apy);

        let spread = metrics.implied_fixed_apy - variable_apy;
        if !spread.is_finite() {
            return Err(PricingError::Overflow {
                formula: Formula::VariableSupplyApy,
            });
        }

        Ok(Self {
            block_height: raw.block_height,
            fixed_minus_variable: spread,
            variable_supply_apy: variable_apy,
            seconds_to_maturity,
            input,
            metrics,
            display,
        })
    }
}

/// Next series expiry relative to the current block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextExpiry {
    pub block_height: BlockHeight,
    pub min_blocks: u64,
    pub expiry_block: BlockHeight,
    pub blocks_away: u64,
}

/// Pre-formatted values for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDisplay {
    pub spot_price: String,
    pub current_exchange_rate: String,
    pub implied_maturity_rate: String,
    pub implied_fixed_apy: String,
    pub variable_supply_apy: String,
    pub wallet_value_underlying: String,
    pub wallet_value_at_maturity: String,
    pub hedge_ratio: Option<String>,
}
