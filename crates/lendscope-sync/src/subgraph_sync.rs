use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::ToPrimitive;
use chrono::{NaiveDate, Utc};
use deadpool_diesel::postgres::Pool;

use lendscope_db::models::{
    AssetSnapshot, MarketTimeseries, NewMarketTimeseries, NewRawSnapshot, RawSnapshot,
};
use lendscope_db::LendscopePool;
use lendscope_types::{DataSource, MarketConfig, ReserveState};
use lendscope_upstream::{
    AggregationSource, FallbackRpcClient, SubgraphClient, resolve_timestamp_to_block,
    retry_with_backoff,
};
use lendscope_processor::{build_asset_snapshot, market_usd_totals};

use crate::config::SyncOptions;
use crate::error::SyncError;

/// Direct history sync for the one market whose source of record is the
/// subgraph. Point-in-time reserve state is fetched per day at the block
/// nearest that day's UTC midnight, then written through the same canonical
/// records the processors produce.
pub struct SubgraphSyncer {
    db_pool: Pool,
    subgraph: SubgraphClient,
    rpc: FallbackRpcClient,
    market: MarketConfig,
    aggregation: Option<Arc<dyn AggregationSource>>,
    request_delay: Duration,
}

impl SubgraphSyncer {
    pub fn new(
        db_pool: Pool,
        subgraph: SubgraphClient,
        rpc: FallbackRpcClient,
        market: MarketConfig,
    ) -> Self {
        Self {
            db_pool,
            subgraph,
            rpc,
            market,
            aggregation: None,
            request_delay: Duration::from_millis(250),
        }
    }

    /// Enable the `compare_with_aavekit` option by providing the aggregation
    /// client to compare against.
    pub fn with_aggregation(mut self, aggregation: Arc<dyn AggregationSource>) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub const fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn market_key(&self) -> &str {
        &self.market.market_key
    }

    /// Asset-snapshot sync entrypoint used by the orchestrator: fill every
    /// missing day in the trailing window with default options.
    pub async fn sync_all_asset_snapshots(&self, days: u32) -> Result<usize, SyncError> {
        self.sync_missing_days(days, &SyncOptions::default()).await
    }

    /// Full-featured sync of the canonical-subgraph market.
    pub async fn sync_market_timeseries(
        &self,
        market_key: &str,
        days: u32,
        options: &SyncOptions,
    ) -> Result<usize, SyncError> {
        if market_key != self.market.market_key {
            return Err(SyncError::NotSubgraphMarket(market_key.to_string()));
        }

        if options.delete_old_data {
            self.delete_market_rows().await?;
        }

        self.sync_missing_days(days, options).await
    }

    async fn sync_missing_days(&self, days: u32, options: &SyncOptions) -> Result<usize, SyncError> {
        // Pool id resolution is a required stage; transient subgraph errors
        // get the explicit retry wrapper.
        let pool_address = self.market.pool_address.clone();
        let subgraph_pool = retry_with_backoff("resolve subgraph pool", 3, Duration::from_secs(1), || {
            self.subgraph.query_pool_by_address(&pool_address)
        })
        .await?;

        let existing = self.existing_dates().await?;

        let today = Utc::now().date_naive();
        let missing: Vec<NaiveDate> = (0..i64::from(days))
            .map(|offset| today - chrono::Duration::days(offset))
            .filter(|date| !existing.contains(date))
            .collect();

        if missing.is_empty() {
            tracing::debug!(market = %self.market.market_key, "Subgraph history already complete");
            return Ok(0);
        }

        tracing::info!(
            "[SubgraphSyncer] ⛓️  Syncing {} missing day(s) for {}",
            missing.len(),
            self.market.market_key
        );

        let total = missing.len();
        let mut synced = 0;
        let batch_size = options.batch_size.max(1);

        for (batch_index, batch) in missing.chunks(batch_size).enumerate() {
            for &date in batch {
                match self.sync_day(&subgraph_pool.id, date).await {
                    Ok(()) => synced += 1,
                    Err(err) if err_is_fatal(&err) => return Err(err),
                    Err(err) => {
                        tracing::error!(
                            market = %self.market.market_key,
                            %date,
                            error = %err,
                            "Failed to sync subgraph day, skipping"
                        );
                    }
                }
            }

            if options.show_progress {
                let done = (batch_index * batch_size + batch.len()).min(total);
                tracing::info!(
                    "[SubgraphSyncer] ⛓️  Progress: {done}/{total} days for {}",
                    self.market.market_key
                );
            }
            tokio::time::sleep(self.request_delay).await;
        }

        if options.compare_with_aavekit {
            self.compare_with_aavekit().await;
        }

        Ok(synced)
    }

    async fn sync_day(&self, pool_id: &str, date: NaiveDate) -> Result<(), SyncError> {
        let timestamp = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let block_number = resolve_timestamp_to_block(&self.rpc, timestamp as u64).await?;

        let reserves = self
            .subgraph
            .query_reserves_at_block(pool_id, block_number)
            .await?;

        self.persist_day(date, timestamp, block_number as i64, &reserves)
            .await
    }

    async fn persist_day(
        &self,
        date: NaiveDate,
        timestamp: i64,
        block_number: i64,
        reserves: &[ReserveState],
    ) -> Result<(), SyncError> {
        let new_raw = NewRawSnapshot {
            market_key: self.market.market_key.clone(),
            snapshot_date: date,
            snapshot_timestamp: timestamp,
            raw_data: serde_json::to_value(reserves)?,
            data_source: DataSource::Subgraph.as_str().to_string(),
            block_number: Some(block_number),
        };

        let market_key = self.market.market_key.clone();
        let raw = self
            .db_pool
            .interact_with_context(
                format!("persist subgraph raw snapshot: {market_key} {date}"),
                move |conn| RawSnapshot::upsert_by_natural_key(&new_raw, conn),
            )
            .await?;

        let totals = market_usd_totals(reserves);
        let new_timeseries = NewMarketTimeseries {
            market_key: self.market.market_key.clone(),
            snapshot_date: date,
            total_supplied_usd: totals.supplied_usd,
            total_borrowed_usd: totals.borrowed_usd,
            available_liquidity_usd: totals.available_usd,
            data_source: DataSource::Subgraph.as_str().to_string(),
            raw_data_id: Some(raw.id),
        };

        let market_key = self.market.market_key.clone();
        self.db_pool
            .interact_with_context(
                format!("upsert subgraph market timeseries: {market_key} {date}"),
                move |conn| MarketTimeseries::upsert_by_natural_key(&new_timeseries, conn),
            )
            .await?;

        for reserve in reserves {
            let new_asset = build_asset_snapshot(&raw, reserve);
            let asset = new_asset.underlying_asset.clone();
            let market_key = self.market.market_key.clone();
            self.db_pool
                .interact_with_context(
                    format!("upsert subgraph asset snapshot: {market_key} {asset} {date}"),
                    move |conn| AssetSnapshot::upsert_by_natural_key(&new_asset, conn),
                )
                .await?;
        }

        Ok(())
    }

    async fn existing_dates(&self) -> Result<HashSet<NaiveDate>, SyncError> {
        let market_key = self.market.market_key.clone();
        let dates = self
            .db_pool
            .interact_with_context(
                format!("fetch collected subgraph dates: {market_key}"),
                move |conn| {
                    RawSnapshot::find_dates_for_market(
                        &market_key,
                        DataSource::Subgraph.as_str(),
                        conn,
                    )
                },
            )
            .await?;
        Ok(dates.into_iter().collect())
    }

    async fn delete_market_rows(&self) -> Result<(), SyncError> {
        let market_key = self.market.market_key.clone();
        tracing::warn!(market = %market_key, "Deleting existing rows before re-sync");

        let deleted = self
            .db_pool
            .interact_with_context(
                format!("purge market rows: {market_key}"),
                move |conn| -> Result<usize, diesel::result::Error> {
                    let mut deleted = AssetSnapshot::delete_by_market(&market_key, conn)?;
                    deleted += MarketTimeseries::delete_by_market(&market_key, conn)?;
                    deleted += RawSnapshot::delete_by_market(&market_key, conn)?;
                    Ok(deleted)
                },
            )
            .await?;

        tracing::info!(market = %self.market.market_key, deleted, "Purged market rows");
        Ok(())
    }

    /// Log how far the subgraph-derived totals drift from the aggregation
    /// API's current view. Diagnostic only; failures are logged, not raised.
    async fn compare_with_aavekit(&self) {
        let Some(aggregation) = &self.aggregation else {
            tracing::warn!("compare_with_aavekit requested but no aggregation client configured");
            return;
        };

        let aavekit_totals = match aggregation.query_reserves(&self.market.market_key).await {
            Ok(reserves) => market_usd_totals(&reserves),
            Err(err) => {
                tracing::warn!(error = %err, "Comparison fetch from aggregation API failed");
                return;
            }
        };

        let market_key = self.market.market_key.clone();
        let latest = self
            .db_pool
            .interact_with_context(
                format!("fetch latest market timeseries: {market_key}"),
                move |conn| {
                    let rows = MarketTimeseries::find_by_market(&market_key, conn)?;
                    Ok::<_, diesel::result::Error>(rows.into_iter().next_back())
                },
            )
            .await;

        match latest {
            Ok(Some(row)) => {
                let subgraph_supplied = row.total_supplied_usd.to_f64().unwrap_or(0.0);
                let aavekit_supplied = aavekit_totals.supplied_usd.to_f64().unwrap_or(0.0);
                tracing::info!(
                    market = %self.market.market_key,
                    subgraph_supplied,
                    aavekit_supplied,
                    delta = subgraph_supplied - aavekit_supplied,
                    "Subgraph vs aggregation API supplied totals"
                );
            }
            Ok(None) => {
                tracing::warn!(market = %self.market.market_key, "No synced rows to compare");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Comparison read failed");
            }
        }
    }
}

fn err_is_fatal(err: &SyncError) -> bool {
    matches!(err, SyncError::Upstream(upstream) if upstream.is_fatal())
}
