use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::market_timeseries;

/// Canonical per-day market totals. One row per (market, day); the 7d/30d/
/// 3m/6m/1y views are derived on read by cutoff-date filtering instead of
/// being stored once per window.
///
/// `available_liquidity_usd` is always `total_supplied_usd -
/// total_borrowed_usd`, computed by the processor so the identity holds
/// exactly.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = market_timeseries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MarketTimeseries {
    pub id: i32,
    pub market_key: String,
    pub snapshot_date: NaiveDate,
    pub total_supplied_usd: BigDecimal,
    pub total_borrowed_usd: BigDecimal,
    pub available_liquidity_usd: BigDecimal,
    pub data_source: String,
    pub raw_data_id: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = market_timeseries)]
pub struct NewMarketTimeseries {
    pub market_key: String,
    pub snapshot_date: NaiveDate,
    pub total_supplied_usd: BigDecimal,
    pub total_borrowed_usd: BigDecimal,
    pub available_liquidity_usd: BigDecimal,
    pub data_source: String,
    pub raw_data_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, AsChangeset)]
#[diesel(table_name = market_timeseries)]
pub struct MarketTimeseriesUpdate {
    pub total_supplied_usd: Option<BigDecimal>,
    pub total_borrowed_usd: Option<BigDecimal>,
    pub available_liquidity_usd: Option<BigDecimal>,
    pub data_source: Option<String>,
    pub raw_data_id: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MarketTimeseries {
    pub fn find_by_natural_key(
        market_key: &str,
        snapshot_date: NaiveDate,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        market_timeseries::table
            .filter(market_timeseries::market_key.eq(market_key))
            .filter(market_timeseries::snapshot_date.eq(snapshot_date))
            .first(conn)
    }

    pub fn find_by_market(market_key: &str, conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        market_timeseries::table
            .filter(market_timeseries::market_key.eq(market_key))
            .order(market_timeseries::snapshot_date.asc())
            .load(conn)
    }

    /// Window view over the canonical series: rows on or after `cutoff`.
    pub fn find_by_market_since(
        market_key: &str,
        cutoff: NaiveDate,
        conn: &mut PgConnection,
    ) -> QueryResult<Vec<Self>> {
        market_timeseries::table
            .filter(market_timeseries::market_key.eq(market_key))
            .filter(market_timeseries::snapshot_date.ge(cutoff))
            .order(market_timeseries::snapshot_date.asc())
            .load(conn)
    }

    pub fn create(new_row: &NewMarketTimeseries, conn: &mut PgConnection) -> QueryResult<Self> {
        diesel::insert_into(market_timeseries::table)
            .values(new_row)
            .returning(Self::as_returning())
            .get_result(conn)
    }

    pub fn update(
        &self,
        updates: &MarketTimeseriesUpdate,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        diesel::update(market_timeseries::table.find(self.id))
            .set(updates)
            .returning(Self::as_returning())
            .get_result(conn)
    }

    /// Upsert keyed by (market_key, snapshot_date). Reprocessing the same raw
    /// snapshot lands on the same row, so the pipeline is safe to re-run.
    pub fn upsert_by_natural_key(
        new_row: &NewMarketTimeseries,
        conn: &mut PgConnection,
    ) -> QueryResult<Self> {
        match Self::find_by_natural_key(&new_row.market_key, new_row.snapshot_date, conn) {
            Ok(existing) => {
                let updates = MarketTimeseriesUpdate {
                    total_supplied_usd: Some(new_row.total_supplied_usd.clone()),
                    total_borrowed_usd: Some(new_row.total_borrowed_usd.clone()),
                    available_liquidity_usd: Some(new_row.available_liquidity_usd.clone()),
                    data_source: Some(new_row.data_source.clone()),
                    raw_data_id: new_row.raw_data_id,
                    updated_at: Some(Utc::now()),
                };
                existing.update(&updates, conn)
            }
            Err(diesel::result::Error::NotFound) => Self::create(new_row, conn),
            Err(e) => Err(e),
        }
    }

    pub fn delete_by_market(market_key: &str, conn: &mut PgConnection) -> QueryResult<usize> {
        diesel::delete(
            market_timeseries::table.filter(market_timeseries::market_key.eq(market_key)),
        )
        .execute(conn)
    }

    pub fn count_by_market(market_key: &str, conn: &mut PgConnection) -> QueryResult<i64> {
        market_timeseries::table
            .filter(market_timeseries::market_key.eq(market_key))
            .count()
            .get_result(conn)
    }
}
