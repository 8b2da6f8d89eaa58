//! Report rendering
//!
//! The main artifact is an HTML page: the ranked rows are serialized to a
//! JSON array and substituted for the `$table_json` placeholder of a
//! template. For quick looks from a terminal, rows can also be printed as a
//! table or as JSON through an [`OutputFormatter`].
//!
//! # Examples
//!
//! ```
//! use logstat::output::{render_html, get_formatter};
//! use logstat::types::{ParseStats, ReportRow, RequestUrl};
//!
//! let rows = vec![ReportRow {
//!     url: RequestUrl::new("/a"),
//!     count: 2,
//!     count_perc: 100.0,
//!     time_sum: 2.0,
//!     time_perc: 100.0,
//!     time_avg: 1.0,
//!     time_max: 1.5,
//!     time_med: 1.0,
//! }];
//!
//! let html = render_html("<script>var table = $table_json;</script>", &rows).unwrap();
//! assert!(html.contains(r#""url":"/a""#));
//!
//! let stats = ParseStats { parsed: 2, unparsed: 0 };
//! println!("{}", get_formatter(false).format_report(&rows, &stats));
//! ```

use crate::error::{LogstatError, Result};
use logstat_core::types::{ParseStats, ReportRow};
use prettytable::{Table, format, row};
use serde_json::json;
use std::path::Path;
use tracing::debug;

/// Placeholder replaced by the rows in the HTML template
pub const TABLE_PLACEHOLDER: &str = "$table_json";

/// Template used when no `REPORT_TEMPLATE` is configured
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/report.html");

/// Load the configured template, or the built-in one
pub async fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        None => Ok(DEFAULT_TEMPLATE.to_string()),
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            LogstatError::Template(format!("cannot read template '{}': {e}", path.display()))
        }),
    }
}

/// Substitute the rows into an HTML template
///
/// # Errors
///
/// Returns [`LogstatError::Template`] when the template has no
/// `$table_json` placeholder.
pub fn render_html(template: &str, rows: &[ReportRow]) -> Result<String> {
    if !template.contains(TABLE_PLACEHOLDER) {
        return Err(LogstatError::Template(format!(
            "template has no {TABLE_PLACEHOLDER} placeholder"
        )));
    }
    // URLs come from untrusted clients; `</script>` must not end the script
    let table_json = serde_json::to_string(rows)?.replace("</", r"<\/");
    Ok(template.replace(TABLE_PLACEHOLDER, &table_json))
}

/// Write a rendered report, creating its directory if needed
///
/// The page is written next to its destination and renamed into place, so
/// the report path only ever holds a complete report.
pub async fn write_report(path: &Path, html: &str) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(dir).await?;
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, html).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    debug!("Wrote {} bytes to {}", html.len(), path.display());
    Ok(())
}

/// Trait for terminal output formatters
pub trait OutputFormatter {
    /// Format ranked rows together with the parse counters
    fn format_report(&self, rows: &[ReportRow], stats: &ParseStats) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    /// Format seconds with millisecond precision
    fn format_seconds(seconds: f64) -> String {
        format!("{seconds:.3}")
    }

    /// Format a 0-100 share
    fn format_percent(percent: f64) -> String {
        format!("{percent:.2}%")
    }
}

impl OutputFormatter for TableFormatter {
    fn format_report(&self, rows: &[ReportRow], stats: &ParseStats) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        table.set_titles(row![
            b -> "URL",
            b -> "Count",
            b -> "Count %",
            b -> "Time Sum",
            b -> "Time %",
            b -> "Avg",
            b -> "Max",
            b -> "Median"
        ]);

        for report_row in rows {
            table.add_row(row![
                report_row.url,
                r -> report_row.count,
                r -> Self::format_percent(report_row.count_perc),
                r -> Self::format_seconds(report_row.time_sum),
                r -> Self::format_percent(report_row.time_perc),
                r -> Self::format_seconds(report_row.time_avg),
                r -> Self::format_seconds(report_row.time_max),
                r -> Self::format_seconds(report_row.time_med)
            ]);
        }

        format!(
            "{}\n{} lines parsed, {} unparsed ({:.2}%)",
            table,
            stats.parsed,
            stats.unparsed,
            stats.unparsed_percent()
        )
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, rows: &[ReportRow], stats: &ParseStats) -> String {
        let output = json!({
            "rows": rows,
            "stats": {
                "parsed": stats.parsed,
                "unparsed": stats.unparsed,
                "unparsed_percent": stats.unparsed_percent(),
            },
        });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Pick the formatter matching the `--json` flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
