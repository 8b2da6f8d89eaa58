//! Ranked per-URL report rows
//!
//! The [`ReportBuilder`] derives every [`ReportRow`] metric from a finished
//! [`AggregateState`], ranks URLs by cumulative request time and keeps the
//! top `max_rows`. Building is pure: the same state always yields the same
//! rows in the same order.
//!
//! # Ordering
//!
//! Rows are sorted by `time_sum`, highest first. The sort is stable over the
//! state's first-seen order, so URLs with equal `time_sum` appear in the
//! order they first occurred in the log.

use crate::aggregation::AggregateState;
use crate::error::{LogstatError, Result};
use crate::types::ReportRow;
use tracing::debug;

/// Default number of rows kept in a report
pub const DEFAULT_REPORT_SIZE: usize = 1000;

/// Builds ranked report rows from an aggregation pass
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder {
    max_rows: usize,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_SIZE)
    }
}

impl ReportBuilder {
    /// Create a builder keeping at most `max_rows` rows
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// Maximum number of rows produced
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Compute, rank and truncate the per-URL rows
    ///
    /// # Errors
    ///
    /// Returns [`LogstatError::EmptyAggregateState`] when nothing was parsed,
    /// since every percentage would be a division by zero.
    pub fn build(&self, state: &AggregateState) -> Result<Vec<ReportRow>> {
        if state.is_empty() {
            return Err(LogstatError::EmptyAggregateState);
        }

        let parsed_count = state.parsed_count() as f64;
        let total_time = state.total_time();

        let mut rows: Vec<ReportRow> = state
            .iter()
            .map(|(url, times)| {
                let count = times.len();
                let time_sum: f64 = times.iter().sum();
                ReportRow {
                    url: url.clone(),
                    count: count as u64,
                    count_perc: 100.0 * count as f64 / parsed_count,
                    time_sum,
                    time_perc: percent_of(time_sum, total_time),
                    time_avg: time_sum / count as f64,
                    time_max: times.iter().copied().fold(0.0, f64::max),
                    time_med: median(times),
                }
            })
            .collect();

        rows.sort_by(|a, b| b.time_sum.total_cmp(&a.time_sum));
        rows.truncate(self.max_rows);

        debug!(
            "Built {} report rows from {} URLs",
            rows.len(),
            state.url_count()
        );
        Ok(rows)
    }
}

// A log where every request took 0.000s has no time to share out.
fn percent_of(part: f64, total: f64) -> f64 {
    if total > 0.0 { 100.0 * part / total } else { 0.0 }
}

/// Median of a set of observations
///
/// The middle value for an odd count, the mean of the two middle values for
/// an even count, and 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
