//! Run configuration
//!
//! Built-in defaults can be overridden by a JSON file passed with
//! `--config`. Keys use upper snake case and are all optional; a key present
//! in the file replaces the default, an absent key keeps it, and unknown keys
//! are ignored.
//!
//! ```json
//! {
//!     "REPORT_SIZE": 500,
//!     "REPORT_DIR": "/var/www/reports",
//!     "LOG_DIR": "/var/log/nginx",
//!     "UNPARSED_THRESHOLD": 20
//! }
//! ```

use crate::error::{LogstatError, Result};
use logstat_core::aggregation::DEFAULT_UNPARSED_THRESHOLD;
use logstat_core::report::DEFAULT_REPORT_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Effective configuration of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of URLs in the report
    pub report_size: usize,
    /// Directory receiving `report-YYYY.MM.DD.html`
    pub report_dir: PathBuf,
    /// Directory scanned for `nginx-access-ui.log-YYYYMMDD[.gz]`
    pub log_dir: PathBuf,
    /// Log every unparsed line at debug level
    pub debug: bool,
    /// Write diagnostics to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// Tolerated share of unparsed lines, in percent
    pub unparsed_threshold: f64,
    /// HTML template replacing the built-in one
    pub report_template: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_size: DEFAULT_REPORT_SIZE,
            report_dir: PathBuf::from("./reports"),
            log_dir: PathBuf::from("./log"),
            debug: false,
            log_file: None,
            unparsed_threshold: DEFAULT_UNPARSED_THRESHOLD,
            report_template: None,
        }
    }
}

/// Keys read from a configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigOverrides {
    pub report_size: Option<usize>,
    pub report_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub debug: Option<bool>,
    pub log_file: Option<PathBuf>,
    pub unparsed_threshold: Option<f64>,
    pub report_template: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Parse overrides from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Config {
    /// Defaults, overridden by the JSON file at `path` when given
    ///
    /// # Errors
    ///
    /// A missing, unreadable or malformed file is a configuration error: the
    /// run stops before touching any log.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    LogstatError::Config(format!(
                        "cannot read config file '{}': {e}",
                        path.display()
                    ))
                })?;
                let overrides = ConfigOverrides::from_json(&text).map_err(|e| {
                    LogstatError::Config(format!(
                        "cannot parse config file '{}': {e}",
                        path.display()
                    ))
                })?;
                debug!("Loaded config overrides from {}", path.display());
                Self::default().merge(overrides)
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Replace every field present in `overrides`
    pub fn merge(self, overrides: ConfigOverrides) -> Self {
        Self {
            report_size: overrides.report_size.unwrap_or(self.report_size),
            report_dir: overrides.report_dir.unwrap_or(self.report_dir),
            log_dir: overrides.log_dir.unwrap_or(self.log_dir),
            debug: overrides.debug.unwrap_or(self.debug),
            log_file: overrides.log_file.or(self.log_file),
            unparsed_threshold: overrides
                .unparsed_threshold
                .unwrap_or(self.unparsed_threshold),
            report_template: overrides.report_template.or(self.report_template),
        }
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.report_size == 0 {
            return Err(LogstatError::Config(
                "REPORT_SIZE must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.unparsed_threshold) {
            return Err(LogstatError::Config(format!(
                "UNPARSED_THRESHOLD must be between 0 and 100, got {}",
                self.unparsed_threshold
            )));
        }
        Ok(())
    }
}
