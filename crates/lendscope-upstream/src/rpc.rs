use serde::Deserialize;

use crate::error::UpstreamError;

/// Minimal chain view needed to map timestamps onto blocks. Split out as a
/// trait so the binary search below runs against a fake chain in tests.
#[async_trait::async_trait]
pub trait RpcProvider: Send + Sync {
    async fn latest_block_number(&self) -> Result<u64, UpstreamError>;
    async fn block_timestamp(&self, block_number: u64) -> Result<u64, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

/// JSON-RPC client over an ordered list of endpoints. Every call walks the
/// list in priority order and moves to the next endpoint on any error; only
/// full exhaustion surfaces as a failure.
pub struct FallbackRpcClient {
    http_client: reqwest::Client,
    endpoints: Vec<String>,
}

impl FallbackRpcClient {
    pub fn new(endpoints: Vec<String>) -> Result<Self, UpstreamError> {
        for endpoint in &endpoints {
            url::Url::parse(endpoint).map_err(|e| {
                UpstreamError::InvalidResponse(format!("invalid RPC url '{endpoint}': {e}"))
            })?;
        }

        Ok(Self {
            http_client: crate::http_client()?,
            endpoints,
        })
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, UpstreamError> {
        for url in &self.endpoints {
            match self.call_endpoint(url, method, &params).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    tracing::warn!(endpoint = %url, method, %err, "RPC endpoint failed, trying next");
                }
            }
        }

        Err(UpstreamError::AllEndpointsFailed {
            attempted: self.endpoints.len(),
        })
    }

    async fn call_endpoint(
        &self,
        url: &str,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, UpstreamError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.http_client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let envelope: JsonRpcResponse = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(UpstreamError::Rpc {
                url: url.to_string(),
                message: error.message,
            });
        }

        envelope.result.ok_or(UpstreamError::MissingData)
    }
}

fn parse_hex_quantity(value: &serde_json::Value) -> Result<u64, UpstreamError> {
    let raw = value
        .as_str()
        .ok_or_else(|| UpstreamError::InvalidResponse("quantity is not a string".to_string()))?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| UpstreamError::InvalidResponse(format!("bad hex quantity '{raw}': {e}")))
}

#[async_trait::async_trait]
impl RpcProvider for FallbackRpcClient {
    async fn latest_block_number(&self) -> Result<u64, UpstreamError> {
        let result = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_hex_quantity(&result)
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64, UpstreamError> {
        let tag = format!("{block_number:#x}");
        let result = self
            .call("eth_getBlockByNumber", serde_json::json!([tag, false]))
            .await?;
        parse_hex_quantity(&result["timestamp"])
    }
}

/// Map a Unix timestamp to the greatest block number whose timestamp is at or
/// before it. Binary search over the block range; block timestamps are
/// monotonically non-decreasing, which is the only property relied on.
pub async fn resolve_timestamp_to_block<P: RpcProvider + ?Sized>(
    provider: &P,
    target_timestamp: u64,
) -> Result<u64, UpstreamError> {
    let latest = provider.latest_block_number().await?;
    if provider.block_timestamp(latest).await? <= target_timestamp {
        return Ok(latest);
    }

    let mut low = 0u64;
    let mut high = latest;
    while low < high {
        // upper midpoint so the loop converges on the greatest matching block
        let mid = low + (high - low).div_ceil(2);
        if provider.block_timestamp(mid).await? <= target_timestamp {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    if provider.block_timestamp(low).await? > target_timestamp {
        return Err(UpstreamError::InvalidResponse(format!(
            "timestamp {target_timestamp} predates the chain"
        )));
    }

    Ok(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fake chain: block n has timestamp `genesis + n * block_time`.
    struct FakeChain {
        genesis: u64,
        block_time: u64,
        head: u64,
    }

    #[async_trait::async_trait]
    impl RpcProvider for FakeChain {
        async fn latest_block_number(&self) -> Result<u64, UpstreamError> {
            Ok(self.head)
        }

        async fn block_timestamp(&self, block_number: u64) -> Result<u64, UpstreamError> {
            Ok(self.genesis + block_number * self.block_time)
        }
    }

    #[tokio::test]
    async fn resolves_exact_block_timestamp() {
        let chain = FakeChain {
            genesis: 1_600_000_000,
            block_time: 12,
            head: 10_000,
        };
        let block = resolve_timestamp_to_block(&chain, 1_600_000_000 + 12 * 500)
            .await
            .unwrap();
        assert_eq!(block, 500);
    }

    #[tokio::test]
    async fn resolves_greatest_block_at_or_before_target() {
        let chain = FakeChain {
            genesis: 1_600_000_000,
            block_time: 12,
            head: 10_000,
        };
        // 5 seconds into block 500's slot still resolves to block 500
        let block = resolve_timestamp_to_block(&chain, 1_600_000_000 + 12 * 500 + 5)
            .await
            .unwrap();
        assert_eq!(block, 500);
    }

    #[tokio::test]
    async fn target_after_head_clamps_to_head() {
        let chain = FakeChain {
            genesis: 1_600_000_000,
            block_time: 12,
            head: 100,
        };
        let block = resolve_timestamp_to_block(&chain, 2_000_000_000).await.unwrap();
        assert_eq!(block, 100);
    }

    #[tokio::test]
    async fn target_before_genesis_is_an_error() {
        let chain = FakeChain {
            genesis: 1_600_000_000,
            block_time: 12,
            head: 100,
        };
        assert!(resolve_timestamp_to_block(&chain, 42).await.is_err());
    }

    #[test]
    fn hex_quantities_parse() {
        assert_eq!(
            parse_hex_quantity(&serde_json::json!("0x10")).unwrap(),
            16
        );
        assert!(parse_hex_quantity(&serde_json::json!(16)).is_err());
        assert!(parse_hex_quantity(&serde_json::json!("0xzz")).is_err());
    }
}
