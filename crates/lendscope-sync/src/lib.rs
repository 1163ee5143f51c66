pub mod config;
pub mod error;
pub mod reads;
pub mod subgraph_sync;

use chrono::Utc;
use deadpool_diesel::postgres::Pool;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use lendscope_collector::Collector;
use lendscope_db::models::RawSnapshot;
use lendscope_db::LendscopePool;
use lendscope_processor::{AssetProcessor, MarketProcessor};

pub use config::{SyncConfig, SyncOptions};
pub use error::SyncError;
pub use reads::TimeseriesReader;
pub use subgraph_sync::SubgraphSyncer;

/// What one orchestrated run accomplished.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncRunSummary {
    pub collected_today: usize,
    pub backfilled: usize,
    pub backfill_failures: usize,
    pub market_rows: usize,
    pub asset_rows: usize,
    pub subgraph_days: usize,
    pub purged: usize,
}

/// Top-level routine the scheduler invokes: collect, backfill, process,
/// subgraph-sync, clean up. Stage order guarantees that collection for a
/// (market, day) pair finishes before the processors consider it — there is
/// no lock, just program order.
pub struct SyncService {
    db_pool: Pool,
    collector: Collector,
    market_processor: MarketProcessor,
    asset_processor: AssetProcessor,
    subgraph_syncer: Option<SubgraphSyncer>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(
        db_pool: Pool,
        collector: Collector,
        subgraph_syncer: Option<SubgraphSyncer>,
        config: SyncConfig,
    ) -> Self {
        let market_processor = MarketProcessor::new(db_pool.clone());
        let asset_processor = AssetProcessor::new(db_pool.clone());
        Self {
            db_pool,
            collector,
            market_processor,
            asset_processor,
            subgraph_syncer,
            config,
        }
    }

    /// One full sync pass. Every stage failure is logged with its stage name
    /// and re-thrown to the caller; only the per-pair collection loop is
    /// best-effort.
    pub async fn run_daily_sync(&self) -> Result<SyncRunSummary, SyncError> {
        tracing::info!("[SyncService] 🔄 Starting sync run");
        let started = Utc::now();
        let mut summary = SyncRunSummary::default();

        let daily = self
            .collector
            .collect_daily_snapshots()
            .await
            .inspect_err(|err| {
                tracing::error!(stage = "collect_daily_snapshots", error = %err, "Sync stage failed");
            })?;
        summary.collected_today = daily.collected();

        let backfill = self
            .collector
            .collect_all_missing_data(self.config.backfill_days)
            .await
            .inspect_err(|err| {
                tracing::error!(stage = "collect_all_missing_data", error = %err, "Sync stage failed");
            })?;
        summary.backfilled = backfill.collected();
        summary.backfill_failures = backfill.failed();

        summary.market_rows = self
            .market_processor
            .process_all_pending()
            .await
            .inspect_err(|err| {
                tracing::error!(stage = "market_processor", error = %err, "Sync stage failed");
            })?;

        summary.asset_rows = self
            .asset_processor
            .process_all_pending()
            .await
            .inspect_err(|err| {
                tracing::error!(stage = "asset_processor", error = %err, "Sync stage failed");
            })?;

        if let Some(syncer) = &self.subgraph_syncer {
            summary.subgraph_days = syncer
                .sync_all_asset_snapshots(self.config.subgraph_backfill_days)
                .await
                .inspect_err(|err| {
                    tracing::error!(stage = "subgraph_sync", error = %err, "Sync stage failed");
                })?;
        }

        summary.purged = self.cleanup_old_raw_snapshots().await.inspect_err(|err| {
            tracing::error!(stage = "cleanup", error = %err, "Sync stage failed");
        })?;

        let elapsed = Utc::now() - started;
        tracing::info!(
            "[SyncService] ✅ Sync run done in {}s: {} collected today, {} backfilled ({} failures), {} market rows, {} asset rows, {} subgraph days, {} purged",
            elapsed.num_seconds(),
            summary.collected_today,
            summary.backfilled,
            summary.backfill_failures,
            summary.market_rows,
            summary.asset_rows,
            summary.subgraph_days,
            summary.purged
        );
        Ok(summary)
    }

    /// Scheduler loop: run, sleep, repeat until cancelled. Failures are
    /// logged and the next interval still happens.
    pub async fn run_forever(&self, shutdown: CancellationToken) {
        loop {
            if shutdown.is_cancelled() {
                tracing::info!("[SyncService] Shutdown requested");
                break;
            }

            if let Err(err) = self.run_daily_sync().await {
                tracing::error!(error = %err, "[SyncService] 🔴 Sync run failed");
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = sleep(self.config.sync_interval) => {}
            }
        }
    }

    async fn cleanup_old_raw_snapshots(&self) -> Result<usize, SyncError> {
        let cutoff =
            Utc::now().date_naive() - chrono::Duration::days(self.config.raw_retention_days);
        let purged = self
            .db_pool
            .interact_with_context(
                format!("purge raw snapshots before {cutoff}"),
                move |conn| RawSnapshot::delete_older_than(cutoff, conn),
            )
            .await?;

        if purged > 0 {
            tracing::info!("[SyncService] 🧹 Purged {purged} raw snapshot(s) older than {cutoff}");
        }
        Ok(purged)
    }
}
