use lendscope_types::ReserveState;
use serde::Deserialize;

/// Reserve shape returned by the aggregation API. Validated here at the
/// boundary and converted into the canonical payload type immediately.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AavekitReserve {
    pub underlying_asset: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i32,
    pub total_a_token_supply: String,
    pub total_current_variable_debt: String,
    pub available_liquidity: String,
    pub price: AavekitPrice,
    pub liquidity_rate: String,
    pub variable_borrow_rate: String,
    pub liquidity_index: String,
    pub variable_borrow_index: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AavekitPrice {
    pub price_in_eth: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AavekitMarket {
    pub market_key: String,
    pub chain_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReservesData {
    pub reserves: Vec<AavekitReserve>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarketsData {
    pub markets: Vec<AavekitMarket>,
}

impl From<AavekitReserve> for ReserveState {
    fn from(reserve: AavekitReserve) -> Self {
        Self {
            underlying_asset: reserve.underlying_asset.to_lowercase(),
            symbol: reserve.symbol,
            name: reserve.name,
            decimals: reserve.decimals,
            total_a_token_supply: reserve.total_a_token_supply,
            total_current_variable_debt: reserve.total_current_variable_debt,
            available_liquidity: reserve.available_liquidity,
            price_in_usd_units: reserve.price.price_in_eth,
            liquidity_rate: reserve.liquidity_rate,
            variable_borrow_rate: reserve.variable_borrow_rate,
            liquidity_index: reserve.liquidity_index,
            variable_borrow_index: reserve.variable_borrow_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aavekit_reserve_converts_with_lowercased_address() {
        let reserve: AavekitReserve = serde_json::from_value(serde_json::json!({
            "underlyingAsset": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "symbol": "USDC",
            "name": "USD Coin",
            "decimals": 6,
            "totalATokenSupply": "4465088507.84705",
            "totalCurrentVariableDebt": "3100200300.4005",
            "availableLiquidity": "1364888207.44655",
            "price": { "priceInEth": "0.99998" },
            "liquidityRate": "31000000000000000000000000",
            "variableBorrowRate": "42000000000000000000000000",
            "liquidityIndex": "1041233450000000000000000000",
            "variableBorrowIndex": "1062114560000000000000000000"
        }))
        .unwrap();

        let state: ReserveState = reserve.into();
        assert_eq!(
            state.underlying_asset,
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
        assert_eq!(state.price_in_usd_units, "0.99998");
    }

    #[test]
    fn envelope_surfaces_graphql_errors() {
        let envelope: crate::graphql::GraphqlResponse<ReservesData> =
            serde_json::from_value(serde_json::json!({
                "data": null,
                "errors": [{ "message": "unknown market" }]
            }))
            .unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.unwrap()[0].message, "unknown market");
    }
}
