use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::asset_snapshots;

/// Daily per-reserve record: USD totals, realized rates, utilization and the
/// cumulative indices (kept as ray strings so no precision is lost between
/// collection and APR derivation).
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = asset_snapshots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssetSnapshot {
    pub id: i32,
    pub market_key: String,
    pub underlying_asset: String,
    pub snapshot_date: NaiveDate,
    pub snapshot_timestamp: i64,
    pub block_number: Option<i64>,
    pub supply_apr: f64,
    pub borrow_apr: f64,
    pub total_supplied_usd: BigDecimal,
    pub total_borrowed_usd: BigDecimal,
    pub utilization_rate: f64,
    pub oracle_price: BigDecimal,
    pub liquidity_index: String,
    pub variable_borrow_index: String,
    pub data_source: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = asset_snapshots)]
pub struct NewAssetSnapshot {
    pub market_key: String,
    pub underlying_asset: String,
    pub snapshot_date: NaiveDate,
    pub snapshot_timestamp: i64,
    pub block_number: Option<i64>,
    pub supply_apr: f64,
    pub borrow_apr: f64,
    pub total_supplied_usd: BigDecimal,
    pub total_borrowed_usd: BigDecimal,
    pub utilization_rate: f64,
    pub oracle_price: BigDecimal,
    pub liquidity_index: String,
    pub variable_borrow_index: String,
    pub data_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, AsChangeset)]
#[diesel(table_name = asset_snapshots)]
pub struct AssetSnapshotUpdate {
    pub snapshot_timestamp: Option<i64>,
    pub block_number: Option<i64>,
    pub supply_apr: Option<f64>,
    pub borrow_apr: Option<f64>,
    pub total_supplied_usd: Option<BigDecimal>,
    pub total_borrowed_usd: Option<BigDecimal>,
    pub utilization_rate: Option<f64>,
    pub oracle_price: Option<BigDecimal>,
    pub liquidity_index: Option<String>,
    pub variable_borrow_index: Option<String>,
    pub data_source: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AssetSnapshot {
    pub fn find_by_natural_key(
        market_key: &str,
        underlying_asset: &str,
        snapshot_date: NaiveDate,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        asset_snapshots::table
            .filter(asset_snapshots::market_key.eq(market_key))
            .filter(asset_snapshots::underlying_asset.eq(underlying_asset))
            .filter(asset_snapshots::snapshot_date.eq(snapshot_date))
            .first(conn)
    }

    /// Chronological history of one reserve in one market from `cutoff` on.
    pub fn find_history_since(
        market_key: &str,
        underlying_asset: &str,
        cutoff: NaiveDate,
        conn: &mut PgConnection,
    ) -> QueryResult<Vec<Self>> {
        asset_snapshots::table
            .filter(asset_snapshots::market_key.eq(market_key))
            .filter(asset_snapshots::underlying_asset.eq(underlying_asset))
            .filter(asset_snapshots::snapshot_date.ge(cutoff))
            .order(asset_snapshots::snapshot_date.asc())
            .load(conn)
    }

    /// Latest snapshot of every reserve in a market.
    pub fn find_latest_for_market(
        market_key: &str,
        conn: &mut PgConnection,
    ) -> QueryResult<Vec<Self>> {
        use diesel::dsl::max;

        let latest: Option<NaiveDate> = asset_snapshots::table
            .filter(asset_snapshots::market_key.eq(market_key))
            .select(max(asset_snapshots::snapshot_date))
            .first(conn)?;

        match latest {
            Some(date) => asset_snapshots::table
                .filter(asset_snapshots::market_key.eq(market_key))
                .filter(asset_snapshots::snapshot_date.eq(date))
                .order(asset_snapshots::underlying_asset.asc())
                .load(conn),
            None => Ok(Vec::new()),
        }
    }

    pub fn create(new_row: &NewAssetSnapshot, conn: &mut PgConnection) -> QueryResult<Self> {
        diesel::insert_into(asset_snapshots::table)
            .values(new_row)
            .returning(Self::as_returning())
            .get_result(conn)
    }

    pub fn update(
        &self,
        updates: &AssetSnapshotUpdate,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        diesel::update(asset_snapshots::table.find(self.id))
            .set(updates)
            .returning(Self::as_returning())
            .get_result(conn)
    }

    /// Upsert keyed by (market_key, underlying_asset, snapshot_date).
    pub fn upsert_by_natural_key(
        new_row: &NewAssetSnapshot,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        match Self::find_by_natural_key(
            &new_row.market_key,
            &new_row.underlying_asset,
            new_row.snapshot_date,
            conn,
        ) {
            Ok(existing) => {
                let updates = AssetSnapshotUpdate {
                    snapshot_timestamp: Some(new_row.snapshot_timestamp),
                    block_number: new_row.block_number,
                    supply_apr: Some(new_row.supply_apr),
                    borrow_apr: Some(new_row.borrow_apr),
                    total_supplied_usd: Some(new_row.total_supplied_usd.clone()),
                    total_borrowed_usd: Some(new_row.total_borrowed_usd.clone()),
                    utilization_rate: Some(new_row.utilization_rate),
                    oracle_price: Some(new_row.oracle_price.clone()),
                    liquidity_index: Some(new_row.liquidity_index.clone()),
                    variable_borrow_index: Some(new_row.variable_borrow_index.clone()),
                    data_source: Some(new_row.data_source.clone()),
                    updated_at: Some(Utc::now()),
                };
                existing.update(&updates, conn)
            }
            Err(diesel::result::Error::NotFound) => Self::create(new_row, conn),
            Err(e) => Err(e),
        }
    }

    pub fn delete_by_market(market_key: &str, conn: &mut PgConnection) -> QueryResult<usize> {
        diesel::delete(asset_snapshots::table.filter(asset_snapshots::market_key.eq(market_key)))
            .execute(conn)
    }

    pub fn count_by_market(market_key: &str, conn: &mut PgConnection) -> QueryResult<i64> {
        asset_snapshots::table
            .filter(asset_snapshots::market_key.eq(market_key))
            .count()
            .get_result(conn)
    }
}
