use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::ToPrimitive;
use chrono::Utc;
use deadpool_diesel::postgres::Pool;
use moka::future::Cache;

use lendscope_calc::{
    AverageRates, DailySnapshot, IndexPoint, MarketReserveRow, MonthlySnapshot,
    StablecoinAggregate, aggregate_monthly_snapshots, aggregate_stablecoins,
    calculate_average_rates,
};
use lendscope_db::models::{AssetSnapshot, MarketTimeseries};
use lendscope_db::LendscopePool;
use lendscope_types::{MarketRegistry, StablecoinRegistry, Window};

use crate::error::SyncError;

/// Read-side helper the API layer consumes. Window views are derived from
/// the canonical per-day series by cutoff filtering, fronted by an
/// opportunistic cache.
///
/// The cache is never authoritative: a fresh-cache miss always falls through
/// to the database. When the database read fails, a still-held stale entry is
/// served instead and the failure logged ("stale-if-error") — collection
/// paths never do this.
pub struct TimeseriesReader {
    db_pool: Pool,
    registry: Arc<MarketRegistry>,
    fresh: Cache<String, Arc<Vec<MarketTimeseries>>>,
    stale: Cache<String, Arc<Vec<MarketTimeseries>>>,
    asset_fresh: Cache<String, Arc<Vec<AssetSnapshot>>>,
    asset_stale: Cache<String, Arc<Vec<AssetSnapshot>>>,
}

impl TimeseriesReader {
    pub fn new(
        db_pool: Pool,
        registry: Arc<MarketRegistry>,
        cache_ttl: Duration,
        stale_ttl: Duration,
    ) -> Self {
        Self {
            db_pool,
            registry,
            fresh: Cache::builder().time_to_live(cache_ttl).build(),
            stale: Cache::builder().time_to_live(stale_ttl).build(),
            asset_fresh: Cache::builder().time_to_live(cache_ttl).build(),
            asset_stale: Cache::builder().time_to_live(stale_ttl).build(),
        }
    }

    /// Market totals series filtered to the requested trailing window.
    pub async fn market_timeseries_window(
        &self,
        market_key: &str,
        window: Window,
    ) -> Result<Arc<Vec<MarketTimeseries>>, SyncError> {
        self.validate_market(market_key)?;

        let cache_key = format!("{market_key}::{window}");
        if let Some(rows) = self.fresh.get(&cache_key).await {
            return Ok(rows);
        }

        let cutoff = window.cutoff_date(Utc::now().date_naive());
        let key = market_key.to_string();
        let result = self
            .db_pool
            .interact_with_context(
                format!("read market timeseries window: {market_key} {window}"),
                move |conn| MarketTimeseries::find_by_market_since(&key, cutoff, conn),
            )
            .await;

        match result {
            Ok(rows) => {
                let rows = Arc::new(rows);
                self.fresh.insert(cache_key.clone(), rows.clone()).await;
                self.stale.insert(cache_key, rows.clone()).await;
                Ok(rows)
            }
            Err(err) => {
                if let Some(stale) = self.stale.get(&cache_key).await {
                    tracing::warn!(
                        market = %market_key,
                        error = %err,
                        "Serving stale market timeseries after database error"
                    );
                    return Ok(stale);
                }
                Err(err.into())
            }
        }
    }

    /// Per-reserve history filtered to the requested trailing window.
    pub async fn asset_history(
        &self,
        market_key: &str,
        underlying_asset: &str,
        window: Window,
    ) -> Result<Arc<Vec<AssetSnapshot>>, SyncError> {
        self.validate_market(market_key)?;

        let asset = underlying_asset.to_lowercase();
        let cache_key = format!("{market_key}::{asset}::{window}");
        if let Some(rows) = self.asset_fresh.get(&cache_key).await {
            return Ok(rows);
        }

        let cutoff = window.cutoff_date(Utc::now().date_naive());
        let key = market_key.to_string();
        let asset_clone = asset.clone();
        let result = self
            .db_pool
            .interact_with_context(
                format!("read asset history: {market_key} {asset} {window}"),
                move |conn| AssetSnapshot::find_history_since(&key, &asset_clone, cutoff, conn),
            )
            .await;

        match result {
            Ok(rows) => {
                let rows = Arc::new(rows);
                self.asset_fresh.insert(cache_key.clone(), rows.clone()).await;
                self.asset_stale.insert(cache_key, rows.clone()).await;
                Ok(rows)
            }
            Err(err) => {
                if let Some(stale) = self.asset_stale.get(&cache_key).await {
                    tracing::warn!(
                        market = %market_key,
                        asset = %asset,
                        error = %err,
                        "Serving stale asset history after database error"
                    );
                    return Ok(stale);
                }
                Err(err.into())
            }
        }
    }

    /// Trailing-window average rates for one reserve, derived from the
    /// stored cumulative indices.
    pub async fn asset_average_rates(
        &self,
        market_key: &str,
        underlying_asset: &str,
    ) -> Result<AverageRates, SyncError> {
        let history = self
            .asset_history(market_key, underlying_asset, Window::OneYear)
            .await?;

        let points: Vec<IndexPoint> = history
            .iter()
            .map(|row| IndexPoint {
                liquidity_index: row.liquidity_index.clone(),
                variable_borrow_index: row.variable_borrow_index.clone(),
                timestamp: row.snapshot_timestamp,
            })
            .collect();

        Ok(calculate_average_rates(&points, Utc::now().timestamp()))
    }

    /// Calendar-month rollup of one reserve's daily history.
    pub async fn asset_monthly_rollup(
        &self,
        market_key: &str,
        underlying_asset: &str,
    ) -> Result<Vec<MonthlySnapshot>, SyncError> {
        let history = self
            .asset_history(market_key, underlying_asset, Window::OneYear)
            .await?;

        let daily: Vec<DailySnapshot> = history
            .iter()
            .map(|row| DailySnapshot {
                date: row.snapshot_date,
                timestamp: row.snapshot_timestamp,
                total_supplied_usd: row.total_supplied_usd.to_f64().unwrap_or(0.0),
                total_borrowed_usd: row.total_borrowed_usd.to_f64().unwrap_or(0.0),
                utilization_rate: row.utilization_rate,
                supply_apr: row.supply_apr,
                borrow_apr: row.borrow_apr,
                price: row.oracle_price.to_f64().unwrap_or(0.0),
            })
            .collect();

        Ok(aggregate_monthly_snapshots(&daily))
    }

    /// Cross-market stablecoin totals from each market's latest snapshot day.
    pub async fn stablecoin_overview(
        &self,
        stablecoins: &StablecoinRegistry,
    ) -> Result<Vec<StablecoinAggregate>, SyncError> {
        let mut reserves_by_market: HashMap<String, Vec<MarketReserveRow>> = HashMap::new();

        for market in self.registry.all() {
            let market_key = market.market_key.clone();
            let rows = self
                .db_pool
                .interact_with_context(
                    format!("fetch latest asset snapshots: {market_key}"),
                    move |conn| AssetSnapshot::find_latest_for_market(&market_key, conn),
                )
                .await?;

            if rows.is_empty() {
                continue;
            }

            let reserve_rows = rows
                .into_iter()
                .map(|row| MarketReserveRow {
                    underlying_asset: row.underlying_asset,
                    total_supplied_usd: row.total_supplied_usd.to_f64().unwrap_or(0.0),
                    total_borrowed_usd: row.total_borrowed_usd.to_f64().unwrap_or(0.0),
                })
                .collect();
            reserves_by_market.insert(market.market_key.clone(), reserve_rows);
        }

        Ok(aggregate_stablecoins(stablecoins, &reserves_by_market))
    }

    /// Invalid market keys surface immediately (a 404 at the API layer) and
    /// are never retried.
    fn validate_market(&self, market_key: &str) -> Result<(), SyncError> {
        if self.registry.get(market_key).is_none() {
            return Err(SyncError::UnknownMarket(market_key.to_string()));
        }
        Ok(())
    }
}
