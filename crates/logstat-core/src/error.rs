//! Error types for logstat
//!
//! This module defines the error types used throughout the logstat library.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! A line that fails to parse is not an error: it is reported as
//! [`ParseResult::Unparsed`](crate::types::ParseResult::Unparsed) and only
//! counted. Every variant here aborts the run.
//!
//! # Example
//!
//! ```
//! use logstat_core::error::{LogstatError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to LogstatError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for logstat operations
#[derive(Error, Debug)]
pub enum LogstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The log file or log directory could not be opened or read
    #[error("Log source unavailable: {path}: {source}")]
    SourceUnavailable {
        /// The file or directory that failed
        path: PathBuf,
        /// The underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Too many lines did not match the log format
    #[error(
        "Too many unparsed lines: {unparsed_percent:.2}% exceeds the {threshold_percent}% threshold (log format may have changed)"
    )]
    ExcessiveUnparsedRatio {
        /// Share of scanned lines that failed to parse, 0-100
        unparsed_percent: f64,
        /// Configured tolerance, 0-100
        threshold_percent: f64,
    },

    /// A report was requested from a log without a single parsed request
    #[error("No parsed requests to build a report from")]
    EmptyAggregateState,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report template error
    #[error("Template error: {0}")]
    Template(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl LogstatError {
    /// Wrap an IO failure on a log file or directory
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for Results in logstat
///
/// # Example
///
/// ```
/// use logstat_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, LogstatError>;
