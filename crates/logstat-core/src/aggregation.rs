//! Single-pass aggregation of parsed log lines
//!
//! The [`Aggregator`] consumes a stream of [`ParseResult`]s exactly once and
//! produces an [`AggregateState`]: every request time observed per URL plus
//! the parsed/unparsed counters. Once the stream is exhausted the unparsed
//! share is checked against the configured tolerance, so a log whose format
//! has changed fails loudly instead of producing a near-empty report.
//!
//! # Memory
//!
//! Every individual request time is kept until the report is built because
//! the median is exact. Peak memory is therefore proportional to the number
//! of parsed requests in the log, while line reading itself stays bounded.
//! Each distinct URL is stored once, as the key of the slot index.
//!
//! # Examples
//!
//! ```
//! use logstat_core::aggregation::Aggregator;
//! use logstat_core::types::{ParseResult, RequestUrl};
//!
//! let results = vec![
//!     ParseResult::Parsed { url: RequestUrl::new("/a"), request_time: 0.5 },
//!     ParseResult::Parsed { url: RequestUrl::new("/a"), request_time: 1.5 },
//!     ParseResult::Unparsed { raw: "garbage".to_string() },
//! ];
//!
//! let state = Aggregator::new(50.0).aggregate_iter(results).unwrap();
//! assert_eq!(state.parsed_count(), 2);
//! assert_eq!(state.unparsed_count(), 1);
//! assert_eq!(state.total_time(), 2.0);
//! ```

use crate::error::{LogstatError, Result};
use crate::types::{ParseResult, ParseStats, RequestUrl};
use futures::stream::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tracing::{debug, info};

/// Default tolerated share of unparsed lines, in percent
pub const DEFAULT_UNPARSED_THRESHOLD: f64 = 50.0;

/// Request times collected per URL during one pass over a log
///
/// URLs are kept in the order they were first seen in the log. The report
/// builder relies on this order to break ties deterministically.
#[derive(Debug, Clone, Default)]
pub struct AggregateState {
    index: HashMap<RequestUrl, usize>,
    times: Vec<Vec<f64>>,
    parsed_count: u64,
    unparsed_count: u64,
    total_time: f64,
}

impl AggregateState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one parse result
    pub fn record(&mut self, result: ParseResult) {
        match result {
            ParseResult::Parsed { url, request_time } => {
                self.parsed_count += 1;
                self.total_time += request_time;
                match self.index.get(&url) {
                    Some(&slot) => self.times[slot].push(request_time),
                    None => {
                        self.index.insert(url, self.times.len());
                        self.times.push(vec![request_time]);
                    }
                }
            }
            ParseResult::Unparsed { .. } => self.unparsed_count += 1,
        }
    }

    /// Number of lines that matched the log format
    pub fn parsed_count(&self) -> u64 {
        self.parsed_count
    }

    /// Number of lines that did not
    pub fn unparsed_count(&self) -> u64 {
        self.unparsed_count
    }

    /// Sum of all parsed request times, regardless of URL
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of distinct URLs
    pub fn url_count(&self) -> usize {
        self.times.len()
    }

    /// Whether no line has been parsed
    pub fn is_empty(&self) -> bool {
        self.parsed_count == 0
    }

    /// Parsed/unparsed counters
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            parsed: self.parsed_count,
            unparsed: self.unparsed_count,
        }
    }

    /// Iterate over URLs and their request times in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&RequestUrl, &[f64])> {
        // Slots are handed out in first-seen order
        let mut order: Vec<(&RequestUrl, usize)> =
            self.index.iter().map(|(url, &slot)| (url, slot)).collect();
        order.sort_unstable_by_key(|&(_, slot)| slot);
        order
            .into_iter()
            .map(|(url, slot)| (url, self.times[slot].as_slice()))
    }

    /// Request times recorded for one URL
    pub fn times(&self, url: &RequestUrl) -> Option<&[f64]> {
        self.index.get(url).map(|&slot| self.times[slot].as_slice())
    }
}

/// Aggregator for parsed log lines
pub struct Aggregator {
    threshold_percent: f64,
    log_unparsed: bool,
    show_progress: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_UNPARSED_THRESHOLD)
    }
}

impl Aggregator {
    /// Create an aggregator tolerating up to `threshold_percent` (0-100)
    /// unparsed lines
    pub fn new(threshold_percent: f64) -> Self {
        Self {
            threshold_percent,
            log_unparsed: false,
            show_progress: false,
        }
    }

    /// Emit every unparsed line at debug level
    pub fn with_unparsed_logging(mut self, log_unparsed: bool) -> Self {
        self.log_unparsed = log_unparsed;
        self
    }

    /// Enable or disable the progress spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Configured tolerance in percent
    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    /// Consume a stream of parse results and check the unparsed tolerance
    ///
    /// An error item from the stream (the log source failing mid-read) aborts
    /// the pass and is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`LogstatError::ExcessiveUnparsedRatio`] when the share of
    /// unparsed lines exceeds the threshold.
    pub async fn aggregate(
        &self,
        results: impl Stream<Item = Result<ParseResult>>,
    ) -> Result<AggregateState> {
        let mut state = AggregateState::new();
        let progress = self.progress_bar();

        futures::pin_mut!(results);
        while let Some(result) = results.next().await {
            self.record(&mut state, result?);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!(
                "Aggregated {} lines into {} URLs",
                state.stats().total(),
                state.url_count()
            ));
        }

        self.finish(state)
    }

    /// Synchronous counterpart of [`aggregate`](Self::aggregate)
    pub fn aggregate_iter(
        &self,
        results: impl IntoIterator<Item = ParseResult>,
    ) -> Result<AggregateState> {
        let mut state = AggregateState::new();
        for result in results {
            self.record(&mut state, result);
        }
        self.finish(state)
    }

    fn record(&self, state: &mut AggregateState, result: ParseResult) {
        if self.log_unparsed
            && let ParseResult::Unparsed { ref raw } = result
        {
            debug!("Cannot parse log line: {}", raw);
        }
        state.record(result);
    }

    fn finish(&self, state: AggregateState) -> Result<AggregateState> {
        let stats = state.stats();
        let unparsed_percent = stats.unparsed_percent();
        info!(
            "{} lines parsed, {} unparsed ({:.2}%)",
            stats.parsed, stats.unparsed, unparsed_percent
        );

        if stats.exceeds_unparsed_percent(self.threshold_percent) {
            return Err(LogstatError::ExcessiveUnparsedRatio {
                unparsed_percent,
                threshold_percent: self.threshold_percent,
            });
        }

        Ok(state)
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}] {pos} lines processed")
                .unwrap(),
        );
        pb.set_message("Aggregating request times");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    }
}
