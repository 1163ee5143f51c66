use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("GraphQL error: {message}")]
    Graphql { message: String },

    #[error("GraphQL response carried no data")]
    MissingData,

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC call to {url} failed: {message}")]
    Rpc { url: String, message: String },

    #[error("All {attempted} RPC endpoints exhausted")]
    AllEndpointsFailed { attempted: usize },

    #[error("Pool not found in subgraph for address {0}")]
    PoolNotFound(String),

    #[error("Malformed upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Fatal errors exhaust every fallback; callers must not retry them.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AllEndpointsFailed { .. })
    }
}
