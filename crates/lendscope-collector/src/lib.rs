pub mod report;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use deadpool_diesel::postgres::Pool;
use thiserror::Error;

use lendscope_db::models::{NewRawSnapshot, RawSnapshot};
use lendscope_db::{DatabaseError, LendscopePool};
use lendscope_types::{DataSource, MarketConfig, MarketRegistry};
use lendscope_upstream::{AggregationSource, UpstreamError};

pub use report::{CollectionReport, PairOutcome, PairResult};

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Failed to serialize raw payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Ensures a raw snapshot exists for every (market, date) pair in a requested
/// range. Only markets whose source of record is the aggregation API are
/// collected here; the canonical-subgraph market is synced separately.
pub struct Collector {
    db_pool: Pool,
    aggregation: Arc<dyn AggregationSource>,
    registry: Arc<MarketRegistry>,
    request_delay: Duration,
}

impl Collector {
    pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(250);

    pub fn new(
        db_pool: Pool,
        aggregation: Arc<dyn AggregationSource>,
        registry: Arc<MarketRegistry>,
    ) -> Self {
        Self {
            db_pool,
            aggregation,
            registry,
            request_delay: Self::DEFAULT_REQUEST_DELAY,
        }
    }

    pub const fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Collect today's snapshot (UTC) for every aggregation-API market that
    /// does not have one yet.
    pub async fn collect_daily_snapshots(&self) -> Result<CollectionReport, CollectorError> {
        let today = Utc::now().date_naive();
        tracing::info!("[Collector] 📥 Collecting daily snapshots for {today}");
        self.collect_dates(&[today]).await
    }

    /// Backfill: walk the last `days` UTC dates and collect every
    /// (market, date) pair that is missing a raw snapshot. Best-effort — a
    /// failing pair is recorded in the report and the batch continues.
    pub async fn collect_all_missing_data(
        &self,
        days: u32,
    ) -> Result<CollectionReport, CollectorError> {
        let today = Utc::now().date_naive();
        let dates: Vec<NaiveDate> = (0..i64::from(days))
            .map(|offset| today - chrono::Duration::days(offset))
            .collect();

        tracing::info!(
            "[Collector] 📥 Backfilling up to {} days across {} markets",
            days,
            self.registry.aggregation_markets().count()
        );
        let report = self.collect_dates(&dates).await?;
        tracing::info!(
            "[Collector] 📥 Backfill done: {} collected, {} skipped, {} failed",
            report.collected(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    async fn collect_dates(&self, dates: &[NaiveDate]) -> Result<CollectionReport, CollectorError> {
        let mut report = CollectionReport::default();

        for market in self.registry.aggregation_markets() {
            for &date in dates {
                match self.collect_pair(market, date).await {
                    Ok(outcome) => {
                        let fetched = outcome == PairOutcome::Collected;
                        report.record(&market.market_key, date, outcome);
                        if fetched {
                            // advisory pacing toward the upstream API
                            tokio::time::sleep(self.request_delay).await;
                        }
                    }
                    Err(err) => {
                        tracing::error!(
                            market = %market.market_key,
                            %date,
                            error = %err,
                            "Failed to collect raw snapshot, skipping pair"
                        );
                        report.record(&market.market_key, date, PairOutcome::Failed(err.to_string()));
                    }
                }
            }
        }

        Ok(report)
    }

    async fn collect_pair(
        &self,
        market: &MarketConfig,
        date: NaiveDate,
    ) -> Result<PairOutcome, CollectorError> {
        let market_key = market.market_key.clone();
        let exists = self
            .db_pool
            .interact_with_context(
                format!("check raw snapshot exists: {market_key} {date}"),
                move |conn| {
                    RawSnapshot::exists_by_natural_key(
                        &market_key,
                        date,
                        DataSource::Aavekit.as_str(),
                        conn,
                    )
                },
            )
            .await?;

        if exists {
            return Ok(PairOutcome::Skipped);
        }

        let reserves = self.aggregation.query_reserves(&market.market_key).await?;
        let raw_data = serde_json::to_value(&reserves)?;

        let new_snapshot = NewRawSnapshot {
            market_key: market.market_key.clone(),
            snapshot_date: date,
            snapshot_timestamp: date
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc()
                .timestamp(),
            raw_data,
            data_source: DataSource::Aavekit.as_str().to_string(),
            block_number: None,
        };

        let market_key = market.market_key.clone();
        self.db_pool
            .interact_with_context(
                format!("persist raw snapshot: {market_key} {date}"),
                move |conn| RawSnapshot::upsert_by_natural_key(&new_snapshot, conn),
            )
            .await?;

        tracing::debug!(
            market = %market.market_key,
            %date,
            reserves = reserves.len(),
            "Raw snapshot collected"
        );
        Ok(PairOutcome::Collected)
    }
}
