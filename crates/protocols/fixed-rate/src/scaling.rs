//! Fixed-point scaling
//!
//! Chain readings are integers scaled by `10^decimals`. Every formula works
//! on de-scaled values, so conversion happens once, at the snapshot boundary.

use serde::{Deserialize, Serialize};

use crate::constants::scales;
use crate::state::{PricingError, PricingInput, RawSnapshot};

/// A power-of-ten fixed-point scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub decimals: u8,
}

impl Scale {
    pub const fn new(decimals: u8) -> Self {
        Self { decimals }
    }

    /// `10^decimals` as a float
    pub fn factor(&self) -> f64 {
        10f64.powi(self.decimals as i32)
    }

    /// `10^decimals` as an integer, `None` past `u128`
    fn unit(&self) -> Option<u128> {
        10u128.checked_pow(self.decimals as u32)
    }

    /// Tag a raw chain integer with this scale
    pub fn descale(&self, raw: u128) -> Fixed {
        Fixed { raw, scale: *self }
    }

    /// Express `amount` as a raw integer in this scale.
    ///
    /// Exact when this scale is at least as fine as the amount's; otherwise
    /// truncated to this scale's resolution.
    pub fn rescale(&self, amount: Fixed) -> Result<u128, PricingError> {
        let from = amount.scale.decimals;
        let to = self.decimals;

        if to >= from {
            10u128
                .checked_pow((to - from) as u32)
                .and_then(|m| amount.raw.checked_mul(m))
                .ok_or(PricingError::InvalidInput {
                    field: "rescale amount",
                    value: amount.value(),
                })
        } else {
            Ok(10u128
                .checked_pow((from - to) as u32)
                .map_or(0, |d| amount.raw / d))
        }
    }
}

/// Raw chain integer with its scale. The integer is kept exactly; `value`
/// is the float the formulas consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixed {
    pub raw: u128,
    pub scale: Scale,
}

impl Fixed {
    /// Plain number. Whole and fractional parts are converted separately so
    /// large raw values keep their leading digits.
    pub fn value(&self) -> f64 {
        match self.scale.unit() {
            Some(unit) => (self.raw / unit) as f64 + (self.raw % unit) as f64 / unit as f64,
            None => self.raw as f64 / self.scale.factor(),
        }
    }
}

/// Scales for every field of a raw snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenScales {
    pub collateral: Scale,
    pub claim: Scale,
    pub exchange_rate: Scale,
    pub collateral_factor: Scale,
    pub supply_rate: Scale,
}

impl Default for TokenScales {
    /// cUSDC market
    fn default() -> Self {
        Self {
            collateral: scales::CUSDC,
            claim: scales::CLAIM,
            exchange_rate: scales::EXCHANGE_RATE,
            collateral_factor: scales::COLLATERAL_FACTOR,
            supply_rate: scales::SUPPLY_RATE,
        }
    }
}

impl RawSnapshot {
    /// Convert raw chain integers into calculator input
    pub fn descale(&self, scales: &TokenScales, blocks_per_year: f64) -> PricingInput {
        PricingInput {
            claim_reserve: scales.claim.descale(self.claim_reserve).value(),
            collateral_reserve: scales.collateral.descale(self.collateral_reserve).value(),
            min_exchange_rate: scales.exchange_rate.descale(self.min_exchange_rate).value(),
            current_exchange_rate: scales
                .exchange_rate
                .descale(self.current_exchange_rate)
                .value(),
            collateral_factor: scales
                .collateral_factor
                .descale(self.collateral_factor)
                .value(),
            blocks_to_expiry: self.blocks_to_expiry,
            blocks_per_year,
            wallet_ctoken_balance: scales.collateral.descale(self.wallet_ctoken_balance).value(),
            wallet_claim_balance: scales.claim.descale(self.wallet_claim_balance).value(),
        }
    }
}
