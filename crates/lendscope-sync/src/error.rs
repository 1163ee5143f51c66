use thiserror::Error;

use lendscope_collector::CollectorError;
use lendscope_db::DatabaseError;
use lendscope_processor::ProcessorError;
use lendscope_upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unknown market key: {0}")]
    UnknownMarket(String),

    #[error("Market {0} is not synced from the subgraph")]
    NotSubgraphMarket(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("Failed to serialize raw payload: {0}")]
    Serialization(#[from] serde_json::Error),
}
