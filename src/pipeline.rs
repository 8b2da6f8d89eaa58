//! End-to-end runs: find a log, analyze it, write the report
//!
//! ```no_run
//! use logstat::config::Config;
//! use logstat::pipeline::{ReportOutcome, generate_report};
//!
//! # async fn example() -> logstat::Result<()> {
//! let config = Config::load(None)?;
//! match generate_report(&config, false, false).await? {
//!     ReportOutcome::Written(path) => println!("report: {}", path.display()),
//!     ReportOutcome::AlreadyExists(path) => println!("up to date: {}", path.display()),
//!     ReportOutcome::NoLogs => println!("nothing to do"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::Result;
use crate::log_finder::{LogFile, find_latest_log};
use crate::log_reader::LogReader;
use crate::output::{load_template, render_html, write_report};
use logstat_core::aggregation::Aggregator;
use logstat_core::report::ReportBuilder;
use logstat_core::types::{ParseStats, ReportRow};
use std::path::{Path, PathBuf};
use tracing::info;

/// Ranked rows of one log plus its parse counters
#[derive(Debug, Clone)]
pub struct Analysis {
    pub rows: Vec<ReportRow>,
    pub stats: ParseStats,
}

/// What [`generate_report`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// A new report was written to this path
    Written(PathBuf),
    /// The report for the latest log already exists
    AlreadyExists(PathBuf),
    /// The log directory holds no access log
    NoLogs,
}

/// Read, parse, aggregate and rank one log
///
/// # Errors
///
/// Fails when the log cannot be read, when too many lines are unparsed, or
/// when no line parsed at all. No partial report is ever returned.
pub async fn analyze_log(
    path: &Path,
    compressed: bool,
    config: &Config,
    show_progress: bool,
) -> Result<Analysis> {
    let reader = LogReader::open(path, compressed).await?;
    let aggregator = Aggregator::new(config.unparsed_threshold)
        .with_unparsed_logging(config.debug)
        .with_progress(show_progress);

    let state = aggregator.aggregate(reader.parse_results()).await?;
    let rows = ReportBuilder::new(config.report_size).build(&state)?;

    Ok(Analysis {
        rows,
        stats: state.stats(),
    })
}

/// Generate the HTML report for the newest log in `config.log_dir`
///
/// An existing report for the same date is left alone unless `force` is set.
pub async fn generate_report(
    config: &Config,
    force: bool,
    show_progress: bool,
) -> Result<ReportOutcome> {
    let Some(log) = find_latest_log(&config.log_dir)? else {
        return Ok(ReportOutcome::NoLogs);
    };

    let report_path = report_path(config, &log);
    if !force && tokio::fs::try_exists(&report_path).await? {
        info!(
            "Report {} already exists, skipping",
            report_path.display()
        );
        return Ok(ReportOutcome::AlreadyExists(report_path));
    }

    // Load the template first so a bad template fails before the long pass
    let template = load_template(config.report_template.as_deref()).await?;
    let analysis = analyze_log(&log.path, log.compressed, config, show_progress).await?;
    let html = render_html(&template, &analysis.rows)?;
    write_report(&report_path, &html).await?;

    info!(
        "Report with {} URLs written to {}",
        analysis.rows.len(),
        report_path.display()
    );
    Ok(ReportOutcome::Written(report_path))
}

/// Destination of the report generated for `log`
pub fn report_path(config: &Config, log: &LogFile) -> PathBuf {
    config.report_dir.join(log.report_name())
}
