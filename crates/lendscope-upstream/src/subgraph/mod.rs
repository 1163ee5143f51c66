mod types;

use lendscope_types::ReserveState;
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;
use crate::graphql::{GraphqlRequest, GraphqlResponse};
use types::{PoolsData, ReservesData};

pub use types::SubgraphPool;

const POOL_BY_ADDRESS_QUERY: &str = r"
query PoolByAddress($address: String!) {
  pools(where: { lendingPool: $address }) {
    id
    lendingPool
  }
}";

const RESERVES_AT_BLOCK_QUERY: &str = r"
query ReservesAtBlock($pool: String!, $block: Int!) {
  reserves(block: { number: $block }, where: { pool: $pool }) {
    underlyingAsset
    symbol
    name
    decimals
    totalATokenSupply
    totalCurrentVariableDebt
    availableLiquidity
    price { priceInEth }
    liquidityRate
    variableBorrowRate
    liquidityIndex
    variableBorrowIndex
  }
}";

/// Client for the one market whose source of record is the subgraph.
/// Historical point-in-time queries require a block number resolved through
/// [`crate::rpc::resolve_timestamp_to_block`].
pub struct SubgraphClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl SubgraphClient {
    /// `gateway_url` is the GraphQL gateway base; `subgraph_id` scopes every
    /// query to one deployment.
    pub fn new(gateway_url: &str, subgraph_id: &str) -> Result<Self, UpstreamError> {
        let endpoint = format!(
            "{}/subgraphs/id/{subgraph_id}",
            gateway_url.trim_end_matches('/')
        );
        Ok(Self {
            http_client: crate::http_client()?,
            endpoint,
        })
    }

    /// Resolve a pool entity from its on-chain address. Address casing is
    /// normalized before the lookup; the subgraph stores lowercase keys.
    pub async fn query_pool_by_address(
        &self,
        pool_address: &str,
    ) -> Result<SubgraphPool, UpstreamError> {
        let address = pool_address.to_lowercase();
        let data: PoolsData = self
            .post_graphql(
                POOL_BY_ADDRESS_QUERY,
                serde_json::json!({ "address": address }),
            )
            .await?;

        data.pools
            .into_iter()
            .next()
            .ok_or(UpstreamError::PoolNotFound(address))
    }

    /// Reserve state as of a specific block.
    pub async fn query_reserves_at_block(
        &self,
        pool_id: &str,
        block_number: u64,
    ) -> Result<Vec<ReserveState>, UpstreamError> {
        let data: ReservesData = self
            .post_graphql(
                RESERVES_AT_BLOCK_QUERY,
                serde_json::json!({ "pool": pool_id, "block": block_number }),
            )
            .await?;

        Ok(data.reserves.into_iter().map(Into::into).collect())
    }

    async fn post_graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, UpstreamError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let envelope: GraphqlResponse<T> = response.json().await?;
        if let Some(errors) = envelope.errors
            && let Some(first) = errors.into_iter().next()
        {
            return Err(UpstreamError::Graphql {
                message: first.message,
            });
        }

        envelope.data.ok_or(UpstreamError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_scoped_to_the_deployment() {
        let client =
            SubgraphClient::new("https://gateway.thegraph.com/api", "8wR23o1zkS4gpLqL").unwrap();
        assert_eq!(
            client.endpoint,
            "https://gateway.thegraph.com/api/subgraphs/id/8wR23o1zkS4gpLqL"
        );
    }

    #[test]
    fn subgraph_reserve_parses_and_normalizes() {
        let data: ReservesData = serde_json::from_value(serde_json::json!({
            "reserves": [{
                "underlyingAsset": "0x6B175474E89094C44Da98b954EedeAC495271d0F",
                "symbol": "DAI",
                "name": "Dai Stablecoin",
                "decimals": 18,
                "totalATokenSupply": "104650885078470500000000000",
                "totalCurrentVariableDebt": "81002003004005000000000000",
                "availableLiquidity": "23648882074465500000000000",
                "price": { "priceInEth": "0.00000001" },
                "liquidityRate": "28000000000000000000000000",
                "variableBorrowRate": "39000000000000000000000000",
                "liquidityIndex": "1021233450000000000000000000",
                "variableBorrowIndex": "1042114560000000000000000000"
            }]
        }))
        .unwrap();

        let state: ReserveState = data.reserves.into_iter().next().unwrap().into();
        assert_eq!(
            state.underlying_asset,
            "0x6b175474e89094c44da98b954eedeac495271d0f"
        );
        assert_eq!(state.decimals, 18);
    }
}
