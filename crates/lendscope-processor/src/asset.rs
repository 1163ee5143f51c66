use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use deadpool_diesel::postgres::Pool;

use lendscope_calc::ray_to_fraction;
use lendscope_db::models::{AssetSnapshot, NewAssetSnapshot, RawSnapshot};
use lendscope_db::LendscopePool;
use lendscope_types::ReserveState;

use crate::error::ProcessorError;
use crate::totals::reserve_usd_totals;

/// Turns pending raw snapshots into per-reserve daily records.
pub struct AssetProcessor {
    db_pool: Pool,
}

impl AssetProcessor {
    pub const fn new(db_pool: Pool) -> Self {
        Self { db_pool }
    }

    pub async fn process_all_pending(&self) -> Result<usize, ProcessorError> {
        let pending = self
            .db_pool
            .interact_with_context(
                "fetch raw snapshots pending asset processing".to_string(),
                RawSnapshot::find_pending_for_asset_snapshots,
            )
            .await?;

        if pending.is_empty() {
            tracing::debug!("[AssetProcessor] Nothing pending");
            return Ok(0);
        }

        tracing::info!(
            "[AssetProcessor] 🪙 Processing {} pending raw snapshot(s)",
            pending.len()
        );

        let mut processed = 0;
        for raw in pending {
            match self.process_one(&raw).await {
                Ok(reserves) => {
                    processed += 1;
                    tracing::debug!(
                        market = %raw.market_key,
                        date = %raw.snapshot_date,
                        reserves,
                        "Asset snapshots written"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        market = %raw.market_key,
                        date = %raw.snapshot_date,
                        error = %err,
                        "Failed to process raw snapshot into asset snapshots"
                    );
                }
            }
        }

        Ok(processed)
    }

    async fn process_one(&self, raw: &RawSnapshot) -> Result<usize, ProcessorError> {
        let reserves = raw
            .reserves()
            .map_err(|e| ProcessorError::MalformedPayload {
                snapshot_id: raw.id,
                message: e.to_string(),
            })?;

        let count = reserves.len();
        for reserve in reserves {
            let new_row = build_asset_snapshot(raw, &reserve);
            let asset = new_row.underlying_asset.clone();
            let market_key = new_row.market_key.clone();
            let date = new_row.snapshot_date;
            self.db_pool
                .interact_with_context(
                    format!("upsert asset snapshot: {market_key} {asset} {date}"),
                    move |conn| AssetSnapshot::upsert_by_natural_key(&new_row, conn),
                )
                .await?;
        }

        Ok(count)
    }
}

pub fn build_asset_snapshot(raw: &RawSnapshot, reserve: &ReserveState) -> NewAssetSnapshot {
    let totals = reserve_usd_totals(reserve);

    let supplied = totals.supplied_usd.to_f64().unwrap_or(0.0);
    let borrowed = totals.borrowed_usd.to_f64().unwrap_or(0.0);
    let utilization_rate = if supplied > 0.0 { borrowed / supplied } else { 0.0 };

    NewAssetSnapshot {
        market_key: raw.market_key.clone(),
        underlying_asset: reserve.normalized_asset(),
        snapshot_date: raw.snapshot_date,
        snapshot_timestamp: raw.snapshot_timestamp,
        block_number: raw.block_number,
        supply_apr: ray_to_fraction(&reserve.liquidity_rate),
        borrow_apr: ray_to_fraction(&reserve.variable_borrow_rate),
        total_supplied_usd: totals.supplied_usd,
        total_borrowed_usd: totals.borrowed_usd,
        utilization_rate,
        oracle_price: BigDecimal::try_from(totals.price_usd)
            .unwrap_or_else(|_| BigDecimal::zero()),
        liquidity_index: reserve.liquidity_index.clone(),
        variable_borrow_index: reserve.variable_borrow_index.clone(),
        data_source: raw.data_source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_snapshot() -> RawSnapshot {
        RawSnapshot {
            id: 17,
            market_key: "ethereum-v3".to_string(),
            snapshot_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            snapshot_timestamp: 1_756_684_800,
            raw_data: serde_json::json!([]),
            data_source: "aavekit".to_string(),
            block_number: Some(23_000_000),
            created_at: None,
        }
    }

    fn usdc_reserve() -> ReserveState {
        ReserveState {
            underlying_asset: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            total_a_token_supply: "1000000000000".to_string(),
            total_current_variable_debt: "400000000000".to_string(),
            available_liquidity: "600000000000".to_string(),
            price_in_usd_units: "1".to_string(),
            liquidity_rate: "31000000000000000000000000".to_string(),
            variable_borrow_rate: "42000000000000000000000000".to_string(),
            liquidity_index: "1041233450000000000000000000".to_string(),
            variable_borrow_index: "1062114560000000000000000000".to_string(),
        }
    }

    #[test]
    fn snapshot_derives_rates_and_utilization() {
        let row = build_asset_snapshot(&raw_snapshot(), &usdc_reserve());

        assert_eq!(row.underlying_asset, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        assert!((row.supply_apr - 0.031).abs() < 1e-12);
        assert!((row.borrow_apr - 0.042).abs() < 1e-12);
        // 400k borrowed over 1m supplied
        assert!((row.utilization_rate - 0.4).abs() < 1e-12);
        assert_eq!(row.block_number, Some(23_000_000));
        assert_eq!(row.data_source, "aavekit");
        assert_eq!(row.liquidity_index, "1041233450000000000000000000");
    }

    #[test]
    fn empty_reserve_has_zero_utilization() {
        let mut reserve = usdc_reserve();
        reserve.total_a_token_supply = "0".to_string();
        reserve.total_current_variable_debt = "0".to_string();

        let row = build_asset_snapshot(&raw_snapshot(), &reserve);
        assert!(row.utilization_rate.abs() < 1e-12);
    }
}
