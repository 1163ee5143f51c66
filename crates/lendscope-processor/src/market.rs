use deadpool_diesel::postgres::Pool;

use lendscope_db::models::{MarketTimeseries, NewMarketTimeseries, RawSnapshot};
use lendscope_db::LendscopePool;

use crate::error::ProcessorError;
use crate::totals::market_usd_totals;

/// Turns pending raw snapshots into canonical per-day market totals.
///
/// Pending means no `market_timeseries` row exists for the raw snapshot's
/// (market, day). Upserts are keyed by that same natural key, so re-running
/// after a partial pass resumes instead of duplicating.
pub struct MarketProcessor {
    db_pool: Pool,
}

impl MarketProcessor {
    pub const fn new(db_pool: Pool) -> Self {
        Self { db_pool }
    }

    pub async fn process_all_pending(&self) -> Result<usize, ProcessorError> {
        let pending = self
            .db_pool
            .interact_with_context(
                "fetch raw snapshots pending market processing".to_string(),
                RawSnapshot::find_pending_for_market_timeseries,
            )
            .await?;

        if pending.is_empty() {
            tracing::debug!("[MarketProcessor] Nothing pending");
            return Ok(0);
        }

        tracing::info!(
            "[MarketProcessor] 📊 Processing {} pending raw snapshot(s)",
            pending.len()
        );

        let mut processed = 0;
        for raw in pending {
            match self.process_one(&raw).await {
                Ok(()) => processed += 1,
                Err(err) => {
                    tracing::error!(
                        market = %raw.market_key,
                        date = %raw.snapshot_date,
                        error = %err,
                        "Failed to process raw snapshot into market timeseries"
                    );
                }
            }
        }

        Ok(processed)
    }

    async fn process_one(&self, raw: &RawSnapshot) -> Result<(), ProcessorError> {
        let reserves = raw
            .reserves()
            .map_err(|e| ProcessorError::MalformedPayload {
                snapshot_id: raw.id,
                message: e.to_string(),
            })?;

        let totals = market_usd_totals(&reserves);
        let new_row = NewMarketTimeseries {
            market_key: raw.market_key.clone(),
            snapshot_date: raw.snapshot_date,
            total_supplied_usd: totals.supplied_usd,
            total_borrowed_usd: totals.borrowed_usd,
            available_liquidity_usd: totals.available_usd,
            data_source: raw.data_source.clone(),
            raw_data_id: Some(raw.id),
        };

        let market_key = raw.market_key.clone();
        let date = raw.snapshot_date;
        self.db_pool
            .interact_with_context(
                format!("upsert market timeseries: {market_key} {date}"),
                move |conn| MarketTimeseries::upsert_by_natural_key(&new_row, conn),
            )
            .await?;

        Ok(())
    }
}
