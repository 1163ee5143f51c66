use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use std::str::FromStr;

/// Convert an upstream token amount into token units.
///
/// The two upstream sources encode amounts differently: the aggregation API
/// returns human-readable decimal strings ("4465088507.84705"), the subgraph
/// returns raw on-chain integers ("4465088507847050"). There is no flag, so
/// the string itself is the discriminator:
///
/// - a string with a fractional point is already human-readable;
/// - an integer string with at least `decimals` digits is a raw on-chain
///   amount and is scaled down by 10^decimals;
/// - a shorter integer string is already human-readable.
///
/// Unparsable input yields zero.
pub fn to_human_readable(amount: &str, decimals: u32) -> BigDecimal {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return BigDecimal::zero();
    }

    if trimmed.contains('.') {
        return BigDecimal::from_str(trimmed).unwrap_or_else(|_| BigDecimal::zero());
    }

    let Ok(value) = BigDecimal::from_str(trimmed) else {
        return BigDecimal::zero();
    };

    let digits = trimmed.trim_start_matches('-').len();
    if digits >= decimals as usize {
        // raw on-chain integer: shift the scale down by `decimals`
        value * BigDecimal::new(1.into(), i64::from(decimals))
    } else {
        value
    }
}

/// Supplied USD total for one reserve: token units times oracle price.
pub fn calculate_total_supplied_usd(amount: &str, decimals: u32, price_usd: f64) -> f64 {
    let units = to_human_readable(amount, decimals);
    let price = BigDecimal::try_from(price_usd).unwrap_or_else(|_| BigDecimal::zero());
    (units * price).to_f64().unwrap_or(0.0)
}

/// Borrowed USD total for one reserve. Same conversion as the supply side;
/// kept separate so call sites read as what they compute.
pub fn calculate_total_borrowed_usd(amount: &str, decimals: u32, price_usd: f64) -> f64 {
    calculate_total_supplied_usd(amount, decimals, price_usd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn human_readable_integer_passes_through() {
        close(calculate_total_supplied_usd("1", 18, 1.0), 1.0);
    }

    #[test]
    fn human_readable_decimal_passes_through() {
        close(
            calculate_total_supplied_usd("4465088507.84705", 6, 1.0),
            4_465_088_507.847_05,
        );
    }

    #[test]
    fn raw_onchain_amount_is_scaled() {
        close(
            calculate_total_supplied_usd("4465088507847050", 6, 1.0),
            4_465_088_507.847_05,
        );
        // 1000 DAI in wei
        close(
            calculate_total_supplied_usd("1000000000000000000000", 18, 1.0),
            1000.0,
        );
    }

    #[test]
    fn price_multiplies() {
        close(calculate_total_supplied_usd("200", 6, 2.5), 500.0);
    }

    #[test]
    fn garbage_input_is_zero() {
        close(calculate_total_supplied_usd("not-a-number", 18, 1.0), 0.0);
        close(calculate_total_supplied_usd("", 18, 1.0), 0.0);
    }

    #[test]
    fn borrowed_matches_supplied_conversion() {
        close(
            calculate_total_borrowed_usd("3100200300400500", 6, 1.0),
            3_100_200_300.400_5,
        );
    }
}
