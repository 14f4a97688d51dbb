//! Display formatting for pricing values

use crate::constants::{PCT_DISPLAY_DECIMALS, RATE_DISPLAY_DECIMALS};
use crate::state::{PricingDisplay, PricingInput, PricingMetrics};

/// Fixed-decimal string. Values that round to zero print without a sign.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value);
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s[1..].to_string()
    } else {
        s
    }
}

/// Fraction as a percentage string (0.2612 -> "26.12%")
pub fn format_pct(fraction: f64, decimals: usize) -> String {
    format!("{}%", format_fixed(fraction * 100.0, decimals))
}

/// Format every displayed value of one snapshot
pub fn pricing_display(
    input: &PricingInput,
    metrics: &PricingMetrics,
    variable_supply_apy: f64,
) -> PricingDisplay {
    PricingDisplay {
        spot_price: format_fixed(metrics.spot_price, RATE_DISPLAY_DECIMALS),
        current_exchange_rate: format_fixed(input.current_exchange_rate, RATE_DISPLAY_DECIMALS),
        implied_maturity_rate: format_fixed(metrics.implied_maturity_rate, RATE_DISPLAY_DECIMALS),
        implied_fixed_apy: format_pct(metrics.implied_fixed_apy, PCT_DISPLAY_DECIMALS),
        variable_supply_apy: format_pct(variable_supply_apy, PCT_DISPLAY_DECIMALS),
        wallet_value_underlying: format_fixed(
            metrics.wallet.value_in_underlying_units,
            PCT_DISPLAY_DECIMALS,
        ),
        wallet_value_at_maturity: format_fixed(
            metrics.wallet.value_at_maturity,
            PCT_DISPLAY_DECIMALS,
        ),
        hedge_ratio: metrics
            .hedge_ratio
            .map(|r| format_pct(r, PCT_DISPLAY_DECIMALS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(0.022612345, 4), "0.0226");
        assert_eq!(format_fixed(1.0, 2), "1.00");
        assert_eq!(format_fixed(-0.10, 4), "-0.1000");
    }

    #[test]
    fn test_format_fixed_negative_zero() {
        assert_eq!(format_fixed(-0.00001, 2), "0.00");
        assert_eq!(format_fixed(-0.0, 4), "0.0000");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(0.26, 0), "26%");
        assert_eq!(format_pct(0.2612, 2), "26.12%");
        assert_eq!(format_pct(-19.2195, 2), "-1921.95%");
    }
}
