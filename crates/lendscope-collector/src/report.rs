use chrono::NaiveDate;

/// What happened to one (market, date) pair during a collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// Freshly fetched and persisted.
    Collected,
    /// A raw snapshot already existed; nothing fetched.
    Skipped,
    /// Failed with the given reason; the batch carried on.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PairResult {
    pub market_key: String,
    pub date: NaiveDate,
    pub outcome: PairOutcome,
}

/// Outcome ledger of a bulk collection run. Partial failure is data here,
/// not just a log line, so callers and tests can assert on it.
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub results: Vec<PairResult>,
}

impl CollectionReport {
    pub fn record(&mut self, market_key: &str, date: NaiveDate, outcome: PairOutcome) {
        self.results.push(PairResult {
            market_key: market_key.to_string(),
            date,
            outcome,
        });
    }

    /// Number of newly collected snapshots.
    pub fn collected(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Collected))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &PairResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, PairOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&PairOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_by_outcome() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let mut report = CollectionReport::default();
        report.record("ethereum-v3", date, PairOutcome::Collected);
        report.record("polygon-v3", date, PairOutcome::Skipped);
        report.record("arbitrum-v3", date, PairOutcome::Failed("boom".to_string()));
        report.record("optimism-v3", date, PairOutcome::Collected);

        assert_eq!(report.collected(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.failures().next().unwrap().market_key,
            "arbitrum-v3"
        );
    }
}
