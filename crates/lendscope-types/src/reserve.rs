use serde::{Deserialize, Serialize};

/// Normalized per-reserve state, the unit stored inside a raw snapshot
/// payload. Both upstream clients parse into this shape at the boundary so
/// nothing downstream touches untyped JSON.
///
/// On-chain amounts stay as decimal strings; unit scaling happens in
/// [`crate::amount`] when USD totals are derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReserveState {
    pub underlying_asset: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i32,
    /// Total aToken supply, raw or human-readable depending on source.
    pub total_a_token_supply: String,
    pub total_current_variable_debt: String,
    pub available_liquidity: String,
    /// Raw exchange rate from upstream; see `price_to_usd` for the decoding
    /// heuristic.
    pub price_in_usd_units: String,
    /// Annualized supply rate, ray-scaled decimal string.
    pub liquidity_rate: String,
    /// Annualized variable borrow rate, ray-scaled decimal string.
    pub variable_borrow_rate: String,
    /// Cumulative liquidity index, ray-scaled decimal string.
    pub liquidity_index: String,
    /// Cumulative variable borrow index, ray-scaled decimal string.
    pub variable_borrow_index: String,
}

impl ReserveState {
    /// Reserve address normalized the way every lookup expects it.
    pub fn normalized_asset(&self) -> String {
        self.underlying_asset.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_json() {
        let reserve = ReserveState {
            underlying_asset: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            total_a_token_supply: "4465088507847050".to_string(),
            total_current_variable_debt: "3100200300400500".to_string(),
            available_liquidity: "1364888207446550".to_string(),
            price_in_usd_units: "0.99998".to_string(),
            liquidity_rate: "31000000000000000000000000".to_string(),
            variable_borrow_rate: "42000000000000000000000000".to_string(),
            liquidity_index: "1041233450000000000000000000".to_string(),
            variable_borrow_index: "1062114560000000000000000000".to_string(),
        };

        let json = serde_json::to_value(&reserve).unwrap();
        assert_eq!(json["underlyingAsset"], reserve.underlying_asset);
        let back: ReserveState = serde_json::from_value(json).unwrap();
        assert_eq!(back, reserve);
    }

    #[test]
    fn normalized_asset_lowercases() {
        let reserve = ReserveState {
            underlying_asset: "0xDAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
            symbol: "USDT".to_string(),
            name: "Tether USD".to_string(),
            decimals: 6,
            total_a_token_supply: "0".to_string(),
            total_current_variable_debt: "0".to_string(),
            available_liquidity: "0".to_string(),
            price_in_usd_units: "1".to_string(),
            liquidity_rate: "0".to_string(),
            variable_borrow_rate: "0".to_string(),
            liquidity_index: "0".to_string(),
            variable_borrow_index: "0".to_string(),
        };
        assert_eq!(
            reserve.normalized_asset(),
            "0xdac17f958d2ee523a2206206994597c13d831ec7"
        );
    }
}
