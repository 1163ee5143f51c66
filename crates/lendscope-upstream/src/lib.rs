pub mod aavekit;
pub mod error;
mod graphql;
pub mod price;
pub mod retry;
pub mod rpc;
pub mod subgraph;

use std::time::Duration;

pub use aavekit::{AavekitClient, AavekitMarket, AggregationSource};
pub use error::UpstreamError;
pub use price::price_to_usd;
pub use retry::retry_with_backoff;
pub use rpc::{FallbackRpcClient, RpcProvider, resolve_timestamp_to_block};
pub use subgraph::SubgraphClient;

pub fn http_client() -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(UpstreamError::Http)
}
