//! Core domain types for logstat
//!
//! These types carry data between the three stages of the engine: the
//! per-line [`ParseResult`], the [`ParseStats`] counters surfaced for
//! diagnostics, and the final [`ReportRow`] handed to renderers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed request URL
///
/// The request target exactly as it appeared in the log line. No
/// normalization or percent-decoding is applied, so `/a?x=1` and `/a` are
/// different keys.
///
/// # Examples
/// ```
/// use logstat_core::types::RequestUrl;
///
/// let url = RequestUrl::new("/api/v2/banner/25019354");
/// assert_eq!(url.as_str(), "/api/v2/banner/25019354");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestUrl(String);

impl RequestUrl {
    /// Create a new RequestUrl from any string-like type
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RequestUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of parsing one log line
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    /// The line matched the log format
    Parsed {
        /// Request target
        url: RequestUrl,
        /// Request processing time in seconds, finite and non-negative
        request_time: f64,
    },
    /// The line did not match; kept only for diagnostic logging
    Unparsed {
        /// The line as read
        raw: String,
    },
}

impl ParseResult {
    /// Whether the line matched the log format
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseResult::Parsed { .. })
    }
}

/// Parsed/unparsed line counters of one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Lines that matched the log format
    pub parsed: u64,
    /// Lines that did not
    pub unparsed: u64,
}

impl ParseStats {
    /// Total number of scanned lines
    pub fn total(&self) -> u64 {
        self.parsed + self.unparsed
    }

    /// Fraction of scanned lines that failed to parse, 0.0 for an empty log
    pub fn unparsed_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.unparsed as f64 / total as f64,
        }
    }

    /// Same as [`unparsed_ratio`](Self::unparsed_ratio), scaled to 0-100
    pub fn unparsed_percent(&self) -> f64 {
        self.unparsed_ratio() * 100.0
    }

    /// Whether the unparsed share is strictly above `threshold_percent`
    ///
    /// Compared without dividing, so a share exactly equal to the threshold
    /// (7 of 100 at 7%) is never pushed over it by rounding.
    pub fn exceeds_unparsed_percent(&self, threshold_percent: f64) -> bool {
        self.unparsed as f64 * 100.0 > threshold_percent * self.total() as f64
    }
}

/// Summary statistics for one URL
///
/// Field names are part of the rendered report format: the HTML template
/// reads them by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Request URL
    pub url: RequestUrl,
    /// Number of requests to this URL
    pub count: u64,
    /// Share of all parsed requests, 0-100
    pub count_perc: f64,
    /// Cumulative request time in seconds
    pub time_sum: f64,
    /// Share of the total request time of the log, 0-100
    pub time_perc: f64,
    /// Mean request time
    pub time_avg: f64,
    /// Slowest request
    pub time_max: f64,
    /// Median request time
    pub time_med: f64,
}
