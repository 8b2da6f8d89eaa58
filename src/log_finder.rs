//! Discovery of the newest nginx access log
//!
//! Log rotation leaves files named `nginx-access-ui.log-YYYYMMDD`, older ones
//! usually gzipped (`.gz`). Only the newest log is analyzed. When the same
//! date exists both plain and gzipped, the plain file wins: it is the one
//! still being written or the one rotation has not compressed yet.

use crate::error::{LogstatError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};
use walkdir::WalkDir;

/// File name prefix of the rotated access logs
pub const LOG_FILE_PREFIX: &str = "nginx-access-ui.log-";

/// An access log selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    /// Full path to the log
    pub path: PathBuf,
    /// Date encoded in the file name
    pub date: NaiveDate,
    /// Whether the log is gzip-compressed
    pub compressed: bool,
}

impl LogFile {
    /// Recognize a log file name, returning its date and compression
    ///
    /// # Examples
    /// ```
    /// use logstat::log_finder::LogFile;
    ///
    /// let (date, compressed) = LogFile::parse_name("nginx-access-ui.log-20170630.gz").unwrap();
    /// assert_eq!(date.to_string(), "2017-06-30");
    /// assert!(compressed);
    ///
    /// assert!(LogFile::parse_name("nginx-access-ui.log-20170630.bz2").is_none());
    /// ```
    pub fn parse_name(name: &str) -> Option<(NaiveDate, bool)> {
        let rest = name.strip_prefix(LOG_FILE_PREFIX)?;
        let (digits, compressed) = match rest.strip_suffix(".gz") {
            Some(digits) => (digits, true),
            None => (rest, false),
        };

        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = digits[0..4].parse().ok()?;
        let month = digits[4..6].parse().ok()?;
        let day = digits[6..8].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        Some((date, compressed))
    }

    /// Build a LogFile from a path whose name follows the rotation pattern
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (date, compressed) = Self::parse_name(name)?;
        Some(Self {
            path: path.to_path_buf(),
            date,
            compressed,
        })
    }

    /// Name of the report generated for this log, `report-YYYY.MM.DD.html`
    pub fn report_name(&self) -> String {
        format!("report-{}.html", self.date.format("%Y.%m.%d"))
    }
}

/// Find the newest access log directly inside `dir`
///
/// Sub-directories are not searched. Returns `Ok(None)` when no file matches.
///
/// # Errors
///
/// Returns [`LogstatError::SourceUnavailable`] when the directory cannot be
/// read.
pub fn find_latest_log(dir: &Path) -> Result<Option<LogFile>> {
    let mut latest: Option<LogFile> = None;

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            LogstatError::source_unavailable(dir, source)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(candidate) = LogFile::from_path(entry.path()) else {
            trace!("Ignoring {}", entry.path().display());
            continue;
        };

        let newer = match &latest {
            None => true,
            Some(current) => {
                candidate.date > current.date
                    || (candidate.date == current.date && current.compressed && !candidate.compressed)
            }
        };
        if newer {
            debug!("Newest log so far: {}", candidate.path.display());
            latest = Some(candidate);
        }
    }

    match &latest {
        Some(log) => info!("Latest log: {} ({})", log.path.display(), log.date),
        None => info!("No access logs found in {}", dir.display()),
    }
    Ok(latest)
}
