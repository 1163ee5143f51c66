use std::collections::HashMap;

use lendscope_types::StablecoinRegistry;
use serde::Serialize;

/// Live reserve totals for one asset in one market, the join input for
/// stablecoin aggregation. Addresses are expected lowercase.
#[derive(Debug, Clone)]
pub struct MarketReserveRow {
    pub underlying_asset: String,
    pub total_supplied_usd: f64,
    pub total_borrowed_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StablecoinMarketBreakdown {
    pub market_key: String,
    pub total_supplied_usd: f64,
    pub total_borrowed_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StablecoinAggregate {
    pub symbol: String,
    pub name: String,
    pub total_supplied_usd: f64,
    pub total_borrowed_usd: f64,
    pub markets: Vec<StablecoinMarketBreakdown>,
}

/// Cross-reference the stablecoin registry against live reserve data,
/// summing supplied/borrowed USD per stablecoin across every market where it
/// is listed. One row per stablecoin that appears in at least one market;
/// the per-market breakdown is sorted by market key so output is
/// deterministic.
pub fn aggregate_stablecoins(
    registry: &StablecoinRegistry,
    reserves_by_market: &HashMap<String, Vec<MarketReserveRow>>,
) -> Vec<StablecoinAggregate> {
    let mut market_keys: Vec<&String> = reserves_by_market.keys().collect();
    market_keys.sort();

    registry
        .all()
        .iter()
        .filter_map(|coin| {
            let mut markets = Vec::new();
            let mut total_supplied = 0.0;
            let mut total_borrowed = 0.0;

            for market_key in &market_keys {
                let Some(address) = coin.address_in(market_key) else {
                    continue;
                };
                let Some(row) = reserves_by_market[*market_key]
                    .iter()
                    .find(|r| r.underlying_asset == address)
                else {
                    continue;
                };

                total_supplied += row.total_supplied_usd;
                total_borrowed += row.total_borrowed_usd;
                markets.push(StablecoinMarketBreakdown {
                    market_key: (*market_key).clone(),
                    total_supplied_usd: row.total_supplied_usd,
                    total_borrowed_usd: row.total_borrowed_usd,
                });
            }

            if markets.is_empty() {
                return None;
            }

            Some(StablecoinAggregate {
                symbol: coin.symbol.clone(),
                name: coin.name.clone(),
                total_supplied_usd: total_supplied,
                total_borrowed_usd: total_borrowed,
                markets,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendscope_types::StablecoinInfo;

    fn registry() -> StablecoinRegistry {
        StablecoinRegistry::new(vec![StablecoinInfo {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            addresses: HashMap::from([
                ("market-a".to_string(), "0xusdc".to_string()),
                ("market-b".to_string(), "0xusdc".to_string()),
            ]),
        }])
    }

    fn usdc_row(supplied: f64, borrowed: f64) -> MarketReserveRow {
        MarketReserveRow {
            underlying_asset: "0xusdc".to_string(),
            total_supplied_usd: supplied,
            total_borrowed_usd: borrowed,
        }
    }

    #[test]
    fn sums_across_markets_and_lists_both_keys() {
        let reserves = HashMap::from([
            ("market-a".to_string(), vec![usdc_row(100.0, 60.0)]),
            ("market-b".to_string(), vec![usdc_row(50.0, 10.0)]),
        ]);

        let rows = aggregate_stablecoins(&registry(), &reserves);
        assert_eq!(rows.len(), 1);
        let usdc = &rows[0];
        assert!((usdc.total_supplied_usd - 150.0).abs() < 1e-12);
        assert!((usdc.total_borrowed_usd - 70.0).abs() < 1e-12);

        let keys: Vec<&str> = usdc.markets.iter().map(|m| m.market_key.as_str()).collect();
        assert_eq!(keys, vec!["market-a", "market-b"]);
    }

    #[test]
    fn unlisted_stablecoin_produces_no_row() {
        let reserves = HashMap::from([(
            "market-a".to_string(),
            vec![MarketReserveRow {
                underlying_asset: "0xdai".to_string(),
                total_supplied_usd: 10.0,
                total_borrowed_usd: 5.0,
            }],
        )]);

        assert!(aggregate_stablecoins(&registry(), &reserves).is_empty());
    }

    #[test]
    fn missing_market_is_skipped_not_counted() {
        let reserves = HashMap::from([("market-a".to_string(), vec![usdc_row(100.0, 60.0)])]);

        let rows = aggregate_stablecoins(&registry(), &reserves);
        assert_eq!(rows[0].markets.len(), 1);
        assert!((rows[0].total_supplied_usd - 100.0).abs() < 1e-12);
    }
}
