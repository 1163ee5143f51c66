use bigdecimal::{BigDecimal, Zero};

use lendscope_types::{ReserveState, to_human_readable};
use lendscope_upstream::price_to_usd;

/// USD totals for one reserve, exact decimals.
#[derive(Debug, Clone)]
pub struct ReserveTotals {
    pub supplied_usd: BigDecimal,
    pub borrowed_usd: BigDecimal,
    pub price_usd: f64,
}

/// Market-level totals summed over every reserve in a payload.
///
/// `available_usd` is always `supplied - borrowed`, never the independently
/// reported available-liquidity field, so supplied == borrowed + available
/// holds exactly for every derived record.
#[derive(Debug, Clone)]
pub struct MarketTotals {
    pub supplied_usd: BigDecimal,
    pub borrowed_usd: BigDecimal,
    pub available_usd: BigDecimal,
}

pub fn reserve_usd_totals(reserve: &ReserveState) -> ReserveTotals {
    let price_usd = price_to_usd(&reserve.price_in_usd_units);
    let price = BigDecimal::try_from(price_usd).unwrap_or_else(|_| BigDecimal::zero());
    let decimals = u32::try_from(reserve.decimals.max(0)).unwrap_or(0);

    let supplied_usd = to_human_readable(&reserve.total_a_token_supply, decimals) * &price;
    let borrowed_usd = to_human_readable(&reserve.total_current_variable_debt, decimals) * &price;

    ReserveTotals {
        supplied_usd,
        borrowed_usd,
        price_usd,
    }
}

pub fn market_usd_totals(reserves: &[ReserveState]) -> MarketTotals {
    let mut supplied = BigDecimal::zero();
    let mut borrowed = BigDecimal::zero();

    for reserve in reserves {
        let totals = reserve_usd_totals(reserve);
        supplied += totals.supplied_usd;
        borrowed += totals.borrowed_usd;
    }

    let available = &supplied - &borrowed;
    MarketTotals {
        supplied_usd: supplied,
        borrowed_usd: borrowed,
        available_usd: available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::ToPrimitive;

    fn reserve(supply: &str, debt: &str, decimals: i32, price: &str) -> ReserveState {
        ReserveState {
            underlying_asset: "0xusdc".to_string(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals,
            total_a_token_supply: supply.to_string(),
            total_current_variable_debt: debt.to_string(),
            available_liquidity: "0".to_string(),
            price_in_usd_units: price.to_string(),
            liquidity_rate: "0".to_string(),
            variable_borrow_rate: "0".to_string(),
            liquidity_index: "0".to_string(),
            variable_borrow_index: "0".to_string(),
        }
    }

    #[test]
    fn reserve_totals_scale_and_price() {
        let totals = reserve_usd_totals(&reserve("4465088507847050", "3100200300400500", 6, "1"));
        assert!((totals.supplied_usd.to_f64().unwrap() - 4_465_088_507.847_05).abs() < 1e-3);
        assert!((totals.borrowed_usd.to_f64().unwrap() - 3_100_200_300.400_5).abs() < 1e-3);
        assert!((totals.price_usd - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn market_invariant_holds_exactly() {
        let reserves = vec![
            reserve("1000000000", "400000000", 6, "1"),
            reserve("2000000000", "900000000", 6, "1"),
        ];
        let totals = market_usd_totals(&reserves);
        assert_eq!(
            totals.available_usd,
            &totals.supplied_usd - &totals.borrowed_usd
        );
        assert_eq!(
            totals.supplied_usd,
            &totals.borrowed_usd + &totals.available_usd
        );
    }

    #[test]
    fn sub_one_exchange_rate_is_rescaled() {
        // price 0.00000001 decodes to 1 USD under the 1e8 heuristic
        let totals = reserve_usd_totals(&reserve("5000000", "0", 6, "0.00000001"));
        assert!((totals.supplied_usd.to_f64().unwrap() - 5.0).abs() < 1e-9);
    }
}
