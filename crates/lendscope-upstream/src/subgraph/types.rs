use lendscope_types::ReserveState;
use serde::Deserialize;

/// Pool entity as returned by the subgraph. `id` is the internal entity key
/// every reserve query is scoped by; `lending_pool` is the on-chain address.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphPool {
    pub id: String,
    pub lending_pool: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphReserve {
    pub underlying_asset: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i32,
    pub total_a_token_supply: String,
    pub total_current_variable_debt: String,
    pub available_liquidity: String,
    pub price: SubgraphPrice,
    pub liquidity_rate: String,
    pub variable_borrow_rate: String,
    pub liquidity_index: String,
    pub variable_borrow_index: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphPrice {
    pub price_in_eth: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PoolsData {
    pub pools: Vec<SubgraphPool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReservesData {
    pub reserves: Vec<SubgraphReserve>,
}

impl From<SubgraphReserve> for ReserveState {
    fn from(reserve: SubgraphReserve) -> Self {
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
