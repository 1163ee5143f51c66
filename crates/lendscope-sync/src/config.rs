use std::time::Duration;

/// Configuration for sync runtime behaviour.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How far back `collect_all_missing_data` looks.
    pub backfill_days: u32,
    /// How far back the subgraph history sync looks.
    pub subgraph_backfill_days: u32,
    /// Pause between scheduled sync runs.
    pub sync_interval: Duration,
    /// Advisory pacing between upstream requests.
    pub request_delay: Duration,
    /// Days of subgraph history fetched per batch before pausing.
    pub batch_size: usize,
    /// Raw snapshots older than this are purged after processing.
    pub raw_retention_days: i64,
    /// TTL of the opportunistic read cache.
    pub cache_ttl: Duration,
    /// How long an evicted-from-fresh entry may still serve as a stale
    /// fallback when the database read fails.
    pub stale_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backfill_days: 30,
            subgraph_backfill_days: 30,
            sync_interval: Duration::from_secs(24 * 60 * 60),
            request_delay: Duration::from_millis(250),
            batch_size: 10,
            raw_retention_days: 400,
            cache_ttl: Duration::from_secs(60),
            stale_ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Options for one invocation of the subgraph market sync.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Purge the market's existing rows before re-syncing.
    pub delete_old_data: bool,
    /// After syncing, fetch the aggregation API's view of the market and log
    /// the totals delta.
    pub compare_with_aavekit: bool,
    pub show_progress: bool,
    /// Days fetched per batch before pausing.
    pub batch_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            delete_old_data: false,
            compare_with_aavekit: false,
            show_progress: false,
            batch_size: 10,
        }
    }
}
