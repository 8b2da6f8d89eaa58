//! Parsing and aggregation engine for logstat
//!
//! This crate turns raw access log lines into per-URL latency statistics:
//! the line parser, the single-pass aggregator and the report builder.
//! It never touches the filesystem or reads configuration; callers hand it
//! lines and settings explicitly.

pub mod aggregation;
pub mod error;
pub mod parser;
pub mod report;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{LogstatError, Result};
pub use types::{ParseResult, ParseStats, ReportRow, RequestUrl};
