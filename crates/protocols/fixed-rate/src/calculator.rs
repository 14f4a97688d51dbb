//! Fixed-Rate Calculator
//!
//! Pure math functions for implied fixed-rate pricing. No I/O, no async.
//!
//! # Units
//!
//! All inputs are de-scaled (see `scaling`):
//! - reserves and balances in whole tokens
//! - exchange rates in underlying per cToken
//! - collateral factor normalized (0.10 = 10%)
//!
//! The AMM spot price of a claim token, in cTokens, is
//!   spot = collateral_reserve / claim_reserve
//! and the exchange rate it implies at maturity is
//!   implied = min_rate * (1 + collateral_factor - spot)

use fixrate_core::constants::{DAYS_PER_YEAR, SECONDS_PER_YEAR};

use crate::constants::EXTREME_APY;
use crate::state::{ApyFlag, Formula, PricingError, PricingInput, PricingMetrics, WalletValuation};

fn non_negative(field: &'static str, value: f64) -> Result<f64, PricingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PricingError::InvalidInput { field, value })
    }
}

fn finite(formula: Formula, value: f64) -> Result<f64, PricingError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::Overflow { formula })
    }
}

/// AMM spot price of one claim token in cTokens.
pub fn spot_price(claim_reserve: f64, collateral_reserve: f64) -> Result<f64, PricingError> {
    let claim_reserve = non_negative("claim_reserve", claim_reserve)?;
    let collateral_reserve = non_negative("collateral_reserve", collateral_reserve)?;

    if claim_reserve == 0.0 {
        return Err(PricingError::DivisionByZero {
            formula: Formula::SpotPrice,
            denominator: "claim reserve",
        });
    }
    finite(Formula::SpotPrice, collateral_reserve / claim_reserve)
}

/// Exchange rate at maturity implied by the AMM price.
///
/// Can be negative when the claim trades above `1 + collateral_factor`.
pub fn implied_exchange_rate_at_maturity(
    claim_reserve: f64,
    collateral_reserve: f64,
    min_rate: f64,
    collateral_factor: f64,
) -> Result<f64, PricingError> {
    let min_rate = non_negative("min_exchange_rate", min_rate)?;
    let collateral_factor = non_negative("collateral_factor", collateral_factor)?;
    let spot = spot_price(claim_reserve, collateral_reserve)?;

    finite(
        Formula::ImpliedMaturityRate,
        min_rate * (1.0 + collateral_factor - spot),
    )
}

/// Annualized rate implied by the gap between the maturity-implied and
/// current exchange rates.
///
/// apy = (implied / current - 1) * blocks_per_year / blocks_to_expiry
pub fn implied_fixed_apy(
    claim_reserve: f64,
    collateral_reserve: f64,
    min_rate: f64,
    current_rate: f64,
    collateral_factor: f64,
    blocks_to_expiry: u64,
    blocks_per_year: f64,
) -> Result<f64, PricingError> {
    let current_rate = non_negative("current_exchange_rate", current_rate)?;
    let blocks_per_year = non_negative("blocks_per_year", blocks_per_year)?;

    if current_rate == 0.0 {
        return Err(PricingError::DivisionByZero {
            formula: Formula::ImpliedFixedApy,
            denominator: "current exchange rate",
        });
    }
    if blocks_to_expiry == 0 {
        return Err(PricingError::DivisionByZero {
            formula: Formula::ImpliedFixedApy,
            denominator: "blocks to expiry",
        });
    }

    let implied = implied_exchange_rate_at_maturity(
        claim_reserve,
        collateral_reserve,
        min_rate,
        collateral_factor,
    )?;

    finite(
        Formula::ImpliedFixedApy,
        (implied / current_rate - 1.0) * blocks_per_year / blocks_to_expiry as f64,
    )
}

/// Value a wallet's cToken and claim holdings.
///
/// Balances are assumed non-negative and the result is not checked for
/// overflow; `price_snapshot` does both.
pub fn wallet_valuation(
    ctoken_balance: f64,
    claim_balance: f64,
    spot_price: f64,
    current_rate: f64,
    implied_maturity_rate: f64,
) -> WalletValuation {
    let value_in_collateral_units = ctoken_balance + claim_balance * spot_price;

    WalletValuation {
        value_in_collateral_units,
        value_in_underlying_units: value_in_collateral_units * current_rate,
        value_at_maturity: value_in_collateral_units * implied_maturity_rate,
    }
}

/// Share of wallet value held as claim tokens, counted in claim units
/// against total value in cToken units.
pub fn hedge_ratio(
    claim_balance: f64,
    ctoken_balance: f64,
    spot_price: f64,
) -> Result<f64, PricingError> {
    let claim_balance = non_negative("wallet_claim_balance", claim_balance)?;
    let ctoken_balance = non_negative("wallet_ctoken_balance", ctoken_balance)?;
    let spot_price = non_negative("spot_price", spot_price)?;

    let denominator = ctoken_balance + spot_price * claim_balance;
    if denominator == 0.0 {
        return Err(PricingError::DivisionByZero {
            formula: Formula::HedgeRatio,
            denominator: "wallet value",
        });
    }
    finite(Formula::HedgeRatio, claim_balance / denominator)
}

/// Classify an APY for display. The value itself is surfaced unchanged.
pub fn classify_apy(apy: f64) -> ApyFlag {
    if apy.abs() > EXTREME_APY {
        ApyFlag::Extreme
    } else if apy < 0.0 {
        ApyFlag::Negative
    } else {
        ApyFlag::Normal
    }
}

/// Compute every metric for one snapshot.
///
/// Validates the whole input first, so a call either returns the full
/// bundle or fails before computing anything.
pub fn price_snapshot(input: &PricingInput) -> Result<PricingMetrics, PricingError> {
    input.validate()?;

    let spot = spot_price(input.claim_reserve, input.collateral_reserve)?;
    let implied = implied_exchange_rate_at_maturity(
        input.claim_reserve,
        input.collateral_reserve,
        input.min_exchange_rate,
        input.collateral_factor,
    )?;
    let apy = implied_fixed_apy(
        input.claim_reserve,
        input.collateral_reserve,
        input.min_exchange_rate,
        input.current_exchange_rate,
        input.collateral_factor,
        input.blocks_to_expiry,
        input.blocks_per_year,
    )?;

    let wallet = wallet_valuation(
        input.wallet_ctoken_balance,
        input.wallet_claim_balance,
        spot,
        input.current_exchange_rate,
        implied,
    );
    for value in [
        wallet.value_in_collateral_units,
        wallet.value_in_underlying_units,
        wallet.value_at_maturity,
    ] {
        finite(Formula::WalletValuation, value)?;
    }

    let hedge = if input.has_wallet_position() {
        Some(hedge_ratio(
            input.wallet_claim_balance,
            input.wallet_ctoken_balance,
            spot,
        )?)
    } else {
        None
    };

    Ok(PricingMetrics {
        spot_price: spot,
        implied_maturity_rate: implied,
        implied_fixed_apy: apy,
        apy_flag: classify_apy(apy),
        wallet,
        hedge_ratio: hedge,
    })
}

/// Money-market supply APY with daily compounding.
///
/// apy = (rate_per_block * blocks_per_day + 1)^365 - 1
pub fn variable_supply_apy(rate_per_block: f64, blocks_per_year: f64) -> Result<f64, PricingError> {
    let rate_per_block = non_negative("supply_rate_per_block", rate_per_block)?;
    let blocks_per_year = non_negative("blocks_per_year", blocks_per_year)?;

    let blocks_per_day = blocks_per_year / DAYS_PER_YEAR as f64;
    finite(
        Formula::VariableSupplyApy,
        (rate_per_block * blocks_per_day + 1.0).powi(DAYS_PER_YEAR as i32) - 1.0,
    )
}

/// Seconds until maturity at the chain's average block time
pub fn estimate_seconds_to_maturity(
    blocks_to_expiry: u64,
    blocks_per_year: f64,
) -> Result<u64, PricingError> {
    let blocks_per_year = non_negative("blocks_per_year", blocks_per_year)?;
    if blocks_per_year == 0.0 {
        return Err(PricingError::DivisionByZero {
            formula: Formula::MaturityEstimate,
            denominator: "blocks per year",
        });
    }
    let seconds = blocks_to_expiry as f64 * SECONDS_PER_YEAR as f64 / blocks_per_year;
    if !seconds.is_finite() || seconds >= u64::MAX as f64 {
        return Err(PricingError::Overflow {
            formula: Formula::MaturityEstimate,
        });
    }
    Ok(seconds.round() as u64)
}
