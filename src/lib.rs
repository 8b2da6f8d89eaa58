//! logstat - Rank the slowest endpoints of an nginx access log
//!
//! This library provides functionality to:
//! - Find the newest rotated access log (plain or gzipped)
//! - Parse every line and aggregate request times per URL in one pass
//! - Rank URLs by cumulative request time with count, share, mean, max and median
//! - Render the ranking into an HTML report, a terminal table or JSON
//!
//! The parsing and aggregation engine lives in the `logstat-core` crate and
//! is re-exported here.
//!
//! # Examples
//!
//! ```no_run
//! use logstat::{
//!     aggregation::Aggregator,
//!     log_finder::find_latest_log,
//!     log_reader::LogReader,
//!     report::ReportBuilder,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> logstat::Result<()> {
//!     let Some(log) = find_latest_log(Path::new("./log"))? else {
//!         return Ok(());
//!     };
//!
//!     let reader = LogReader::open_log(&log).await?;
//!     let state = Aggregator::new(50.0).aggregate(reader.parse_results()).await?;
//!     let rows = ReportBuilder::new(10).build(&state)?;
//!
//!     for row in rows {
//!         println!("{} {:.3}", row.url, row.time_sum);
//!     }
//!     Ok(())
//! }
//! ```

pub use logstat_core::{aggregation, error, parser, report, types};

pub mod cli;
pub mod config;
pub mod log_finder;
pub mod log_reader;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use error::{LogstatError, Result};
pub use types::{ParseResult, ParseStats, ReportRow, RequestUrl};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
