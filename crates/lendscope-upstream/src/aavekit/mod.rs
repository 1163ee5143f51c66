mod types;

use std::time::Duration;

use lendscope_types::ReserveState;
use moka::future::Cache;
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;
use crate::graphql::{GraphqlRequest, GraphqlResponse};
use types::{MarketsData, ReservesData};

pub use types::AavekitMarket;

const RESERVES_QUERY: &str = r"
query Reserves($marketKey: String!) {
  reserves(marketKey: $marketKey) {
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

const MARKETS_QUERY: &str = r"
query Markets {
  markets {
    marketKey
    chainId
  }
}";

/// Seam the collector depends on, so tests can swap the live client out.
#[async_trait::async_trait]
pub trait AggregationSource: Send + Sync {
    async fn query_reserves(&self, market_key: &str) -> Result<Vec<ReserveState>, UpstreamError>;
}

/// Client for the aggregation GraphQL API ("aavekit"), the source of record
/// for every market except the canonical-subgraph one.
pub struct AavekitClient {
    http_client: reqwest::Client,
    endpoint: String,
    reserve_cache: Cache<String, Vec<ReserveState>>,
}

impl AavekitClient {
    const CACHE_TTL: Duration = Duration::from_secs(60);

    pub fn new(endpoint: &str) -> Result<Self, UpstreamError> {
        Ok(Self {
            http_client: crate::http_client()?,
            endpoint: endpoint.to_string(),
            reserve_cache: Cache::builder().time_to_live(Self::CACHE_TTL).build(),
        })
    }

    pub async fn query_markets(&self) -> Result<Vec<AavekitMarket>, UpstreamError> {
        let data: MarketsData = self
            .post_graphql(MARKETS_QUERY, serde_json::json!({}))
            .await?;
        Ok(data.markets)
    }

    async fn fetch_reserves(&self, market_key: &str) -> Result<Vec<ReserveState>, UpstreamError> {
        if let Some(cached) = self.reserve_cache.get(market_key).await {
            return Ok(cached);
        }

        let data: ReservesData = self
            .post_graphql(
                RESERVES_QUERY,
                serde_json::json!({ "marketKey": market_key }),
            )
            .await?;

        let reserves: Vec<ReserveState> = data.reserves.into_iter().map(Into::into).collect();
        self.reserve_cache
            .insert(market_key.to_string(), reserves.clone())
            .await;
        Ok(reserves)
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

#[async_trait::async_trait]
impl AggregationSource for AavekitClient {
    async fn query_reserves(&self, market_key: &str) -> Result<Vec<ReserveState>, UpstreamError> {
        self.fetch_reserves(market_key).await
    }
}
