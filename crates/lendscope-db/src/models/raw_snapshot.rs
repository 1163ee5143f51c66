use chrono::NaiveDate;
use diesel::dsl::{exists, not};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{asset_snapshots, market_timeseries, raw_snapshots};

/// One raw upstream payload per (market, day, source) — the append-only
/// ingestion ledger every processor reads from. Never mutated downstream;
/// only explicit re-collection overwrites a row.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = raw_snapshots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RawSnapshot {
    pub id: i32,
    pub market_key: String,
    pub snapshot_date: NaiveDate,
    pub snapshot_timestamp: i64,
    pub raw_data: serde_json::Value,
    pub data_source: String,
    pub block_number: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = raw_snapshots)]
pub struct NewRawSnapshot {
    pub market_key: String,
    pub snapshot_date: NaiveDate,
    pub snapshot_timestamp: i64,
    pub raw_data: serde_json::Value,
    pub data_source: String,
    pub block_number: Option<i64>,
}

/// (market_key, first collected day, last collected day, row count) — the
/// coverage summary behind the backfill planner.
pub type MarketCoverage = (String, Option<NaiveDate>, Option<NaiveDate>, i64);

impl RawSnapshot {
    /// Get the data source as an enum
    pub fn data_source_enum(&self) -> Option<lendscope_types::DataSource> {
        self.data_source.parse().ok()
    }

    /// Parse the stored payload back into typed reserve states.
    pub fn reserves(&self) -> Result<Vec<lendscope_types::ReserveState>, serde_json::Error> {
        serde_json::from_value(self.raw_data.clone())
    }

    pub fn find_by_natural_key(
        market_key: &str,
        snapshot_date: NaiveDate,
        data_source: &str,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        raw_snapshots::table
            .filter(raw_snapshots::market_key.eq(market_key))
            .filter(raw_snapshots::snapshot_date.eq(snapshot_date))
            .filter(raw_snapshots::data_source.eq(data_source))
            .first(conn)
    }

    pub fn exists_by_natural_key(
        market_key: &str,
        snapshot_date: NaiveDate,
        data_source: &str,
        conn: &mut PgConnection,
    ) -> QueryResult<bool> {
        diesel::select(exists(
            raw_snapshots::table
                .filter(raw_snapshots::market_key.eq(market_key))
                .filter(raw_snapshots::snapshot_date.eq(snapshot_date))
                .filter(raw_snapshots::data_source.eq(data_source)),
        ))
        .get_result(conn)
    }

    pub fn create(new_snapshot: &NewRawSnapshot, conn: &mut PgConnection) -> QueryResult<Self> {
        diesel::insert_into(raw_snapshots::table)
            .values(new_snapshot)
            .returning(Self::as_returning())
            .get_result(conn)
    }

    /// Create the row, or overwrite payload and provenance fields if the
    /// natural key already exists. Idempotent re-collection path.
    pub fn upsert_by_natural_key(
        new_snapshot: &NewRawSnapshot,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        match Self::find_by_natural_key(
            &new_snapshot.market_key,
            new_snapshot.snapshot_date,
            &new_snapshot.data_source,
            conn,
        ) {
            Ok(existing) => diesel::update(raw_snapshots::table.find(existing.id))
                .set((
                    raw_snapshots::raw_data.eq(&new_snapshot.raw_data),
                    raw_snapshots::snapshot_timestamp.eq(new_snapshot.snapshot_timestamp),
                    raw_snapshots::block_number.eq(new_snapshot.block_number),
                ))
                .returning(Self::as_returning())
                .get_result(conn),
            Err(diesel::result::Error::NotFound) => Self::create(new_snapshot, conn),
            Err(e) => Err(e),
        }
    }

    /// Raw snapshots not yet reflected in `market_timeseries`, oldest first.
    pub fn find_pending_for_market_timeseries(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        raw_snapshots::table
            .filter(not(exists(
                market_timeseries::table
                    .filter(market_timeseries::market_key.eq(raw_snapshots::market_key))
                    .filter(market_timeseries::snapshot_date.eq(raw_snapshots::snapshot_date)),
            )))
            .order(raw_snapshots::snapshot_date.asc())
            .load(conn)
    }

    /// Raw snapshots not yet reflected in `asset_snapshots`, oldest first.
    pub fn find_pending_for_asset_snapshots(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        raw_snapshots::table
            .filter(not(exists(
                asset_snapshots::table
                    .filter(asset_snapshots::market_key.eq(raw_snapshots::market_key))
                    .filter(asset_snapshots::snapshot_date.eq(raw_snapshots::snapshot_date)),
            )))
            .order(raw_snapshots::snapshot_date.asc())
            .load(conn)
    }

    pub fn find_dates_for_market(
        market_key: &str,
        data_source: &str,
        conn: &mut PgConnection,
    ) -> QueryResult<Vec<NaiveDate>> {
        raw_snapshots::table
            .filter(raw_snapshots::market_key.eq(market_key))
            .filter(raw_snapshots::data_source.eq(data_source))
            .select(raw_snapshots::snapshot_date)
            .order(raw_snapshots::snapshot_date.asc())
            .load(conn)
    }

    /// min/max/count per market, across all sources.
    pub fn coverage_by_market(conn: &mut PgConnection) -> QueryResult<Vec<MarketCoverage>> {
        use diesel::dsl::{count_star, max, min};

        raw_snapshots::table
            .group_by(raw_snapshots::market_key)
            .select((
                raw_snapshots::market_key,
                min(raw_snapshots::snapshot_date),
                max(raw_snapshots::snapshot_date),
                count_star(),
            ))
            .load(conn)
    }

    pub fn delete_by_market(market_key: &str, conn: &mut PgConnection) -> QueryResult<usize> {
        diesel::delete(raw_snapshots::table.filter(raw_snapshots::market_key.eq(market_key)))
            .execute(conn)
    }

    /// Retention cleanup: drop ledger rows older than `cutoff`.
    pub fn delete_older_than(cutoff: NaiveDate, conn: &mut PgConnection) -> QueryResult<usize> {
        diesel::delete(raw_snapshots::table.filter(raw_snapshots::snapshot_date.lt(cutoff)))
            .execute(conn)
    }
}
