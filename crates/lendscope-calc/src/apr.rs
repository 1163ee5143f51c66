use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};

const SECONDS_PER_DAY: i64 = 86_400;

/// Realized APR between two cumulative index readings.
///
/// Indices are ray-scaled (1e27) integers encoded as decimal strings; the
/// ratio is taken in arbitrary precision so 27-digit operands lose nothing
/// before the final float conversion. Growth is annualized linearly
/// (`growth * 365 / days`), not compounded — the dashboard displays simple
/// APR. A zero or unparsable start index means an uninitialized reserve and
/// yields 0 rather than an error.
pub fn calculate_apr_from_indices(index_start: &str, index_end: &str, days: f64) -> f64 {
    if days.is_nan() || days <= 0.0 {
        return 0.0;
    }
    let Ok(start) = BigDecimal::from_str(index_start.trim()) else {
        return 0.0;
    };
    let Ok(end) = BigDecimal::from_str(index_end.trim()) else {
        return 0.0;
    };
    if start.is_zero() {
        return 0.0;
    }

    // (end - start) / start, not end/start - 1: the subtraction happens at
    // full precision instead of cancelling in f64.
    let growth = ((end - &start) / &start).to_f64().unwrap_or(0.0);
    growth * (365.0 / days)
}

/// Decode a ray-scaled (1e27) rate string into a plain fraction, e.g.
/// "31000000000000000000000000" -> 0.031. Unparsable input yields 0.
pub fn ray_to_fraction(ray: &str) -> f64 {
    let Ok(value) = BigDecimal::from_str(ray.trim()) else {
        return 0.0;
    };
    // shifting the scale by 27 is exact, unlike dividing by 1e27 in floats
    (value * BigDecimal::new(1.into(), 27)).to_f64().unwrap_or(0.0)
}

/// One historical index reading for a reserve.
#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub liquidity_index: String,
    pub variable_borrow_index: String,
    /// Unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePair {
    pub supply_apr: f64,
    pub borrow_apr: f64,
}

/// Trailing-window average rates; a window is `None` when history does not
/// reach far enough back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageRates {
    pub one_day: Option<RatePair>,
    pub seven_days: Option<RatePair>,
    pub thirty_days: Option<RatePair>,
    pub six_months: Option<RatePair>,
    pub one_year: Option<RatePair>,
}

/// Average lending rates over the standard trailing periods.
///
/// `points` must be pre-sorted in chronological order (oldest first). For
/// each period the snapshot nearest to `now - period` and the snapshot
/// nearest to `now` bracket the APR computation.
pub fn calculate_average_rates(points: &[IndexPoint], now: i64) -> AverageRates {
    debug_assert!(
        points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
        "Index points must be sorted in chronological order"
    );

    AverageRates {
        one_day: rates_for_period(points, now, SECONDS_PER_DAY),
        seven_days: rates_for_period(points, now, 7 * SECONDS_PER_DAY),
        thirty_days: rates_for_period(points, now, 30 * SECONDS_PER_DAY),
        six_months: rates_for_period(points, now, 180 * SECONDS_PER_DAY),
        one_year: rates_for_period(points, now, 365 * SECONDS_PER_DAY),
    }
}

fn rates_for_period(points: &[IndexPoint], now: i64, period_seconds: i64) -> Option<RatePair> {
    let target = now - period_seconds;

    // No history reaching back to the window start means no rate.
    let oldest = points.first()?;
    if oldest.timestamp > target {
        return None;
    }

    let start = nearest_to(points, target)?;
    let end = nearest_to(points, now)?;

    let elapsed = end.timestamp - start.timestamp;
    if elapsed <= 0 {
        return None;
    }
    let days = elapsed as f64 / SECONDS_PER_DAY as f64;

    Some(RatePair {
        supply_apr: calculate_apr_from_indices(&start.liquidity_index, &end.liquidity_index, days),
        borrow_apr: calculate_apr_from_indices(
            &start.variable_borrow_index,
            &end.variable_borrow_index,
            days,
        ),
    })
}

fn nearest_to(points: &[IndexPoint], target: i64) -> Option<&IndexPoint> {
    points.iter().min_by_key(|p| (p.timestamp - target).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAY: &str = "1000000000000000000000000000";

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn apr_matches_growth_times_annualization() {
        // 0.1% growth in one day annualizes to 36.5%
        let apr = calculate_apr_from_indices(RAY, "1001000000000000000000000000", 1.0);
        close(apr, 0.365);
    }

    #[test]
    fn apr_over_thirty_days() {
        // 1% growth over 30 days
        let apr = calculate_apr_from_indices(RAY, "1010000000000000000000000000", 30.0);
        close(apr, 0.01 * 365.0 / 30.0);
    }

    #[test]
    fn apr_supports_fractional_days() {
        let apr = calculate_apr_from_indices(RAY, "1001000000000000000000000000", 0.5);
        close(apr, 0.73);
    }

    #[test]
    fn zero_start_index_is_degenerate_not_fatal() {
        close(calculate_apr_from_indices("0", RAY, 1.0), 0.0);
        close(calculate_apr_from_indices("", RAY, 1.0), 0.0);
        close(calculate_apr_from_indices("bogus", RAY, 1.0), 0.0);
    }

    #[test]
    fn nonpositive_days_yield_zero() {
        close(calculate_apr_from_indices(RAY, RAY, 0.0), 0.0);
        close(calculate_apr_from_indices(RAY, RAY, -3.0), 0.0);
    }

    #[test]
    fn shrinking_index_gives_negative_apr() {
        let apr = calculate_apr_from_indices("1001000000000000000000000000", RAY, 1.0);
        assert!(apr < 0.0);
    }

    #[test]
    fn ray_rates_decode_to_fractions() {
        close(ray_to_fraction("31000000000000000000000000"), 0.031);
        close(ray_to_fraction(RAY), 1.0);
        close(ray_to_fraction("0"), 0.0);
        close(ray_to_fraction("junk"), 0.0);
    }

    fn point(ts: i64, liq: &str, debt: &str) -> IndexPoint {
        IndexPoint {
            liquidity_index: liq.to_string(),
            variable_borrow_index: debt.to_string(),
            timestamp: ts,
        }
    }

    #[test]
    fn average_rates_cover_reachable_windows_only() {
        let now = 1_700_000_000;
        let points = vec![
            point(now - 8 * SECONDS_PER_DAY, RAY, RAY),
            point(
                now - SECONDS_PER_DAY,
                "1000700000000000000000000000",
                "1001400000000000000000000000",
            ),
            point(
                now,
                "1000800000000000000000000000",
                "1001600000000000000000000000",
            ),
        ];

        let rates = calculate_average_rates(&points, now);
        assert!(rates.one_day.is_some());
        assert!(rates.seven_days.is_some());
        // but nothing is 30+ days old
        assert!(rates.thirty_days.is_none());
        assert!(rates.six_months.is_none());
        assert!(rates.one_year.is_none());

        let one = rates.one_day.unwrap();
        close(one.supply_apr, (0.0008 - 0.0007) / 1.0007 * 365.0);
        close(one.borrow_apr, (0.0016 - 0.0014) / 1.0014 * 365.0);

        // the 7d window brackets from the oldest point, 8 days back
        let seven = rates.seven_days.unwrap();
        close(seven.supply_apr, 0.0008 * 365.0 / 8.0);
        close(seven.borrow_apr, 0.0016 * 365.0 / 8.0);
    }

    #[test]
    fn window_without_a_bracketing_pair_is_none() {
        let now = 1_700_000_000;
        // history reaches past the 1d target, but the nearest snapshot to
        // both ends is the same point, so no rate can be derived
        let points = vec![
            point(now - 8 * SECONDS_PER_DAY, RAY, RAY),
            point(now, "1000800000000000000000000000", RAY),
        ];
        assert!(calculate_average_rates(&points, now).one_day.is_none());
    }

    #[test]
    fn average_rates_empty_history_is_all_none() {
        let rates = calculate_average_rates(&[], 1_700_000_000);
        assert_eq!(rates, AverageRates::default());
    }

    #[test]
    fn average_rates_picks_nearest_snapshots() {
        let now = 1_700_000_000;
        // uneven spacing: nearest to now-7d is the 6-day-old point
        let points = vec![
            point(now - 40 * SECONDS_PER_DAY, RAY, RAY),
            point(
                now - 6 * SECONDS_PER_DAY,
                "1000600000000000000000000000",
                RAY,
            ),
            point(now, "1001200000000000000000000000", RAY),
        ];

        let seven = calculate_average_rates(&points, now).seven_days.unwrap();
        // growth between the 6d point and now: ~0.05995% over 6 days
        let expected = (0.0012 - 0.0006) / 1.0006 * 365.0 / 6.0;
        assert!((seven.supply_apr - expected).abs() < 1e-6);
    }
}
