//! CLI interface for logstat
//!
//! # Example
//!
//! ```bash
//! # Write the HTML report for the newest log in ./log (the default command)
//! logstat
//!
//! # Same, with settings from a JSON file, regenerating an existing report
//! logstat --config /etc/logstat.json report --force
//!
//! # Print the ten slowest URLs of a given log
//! logstat top --log /var/log/nginx/nginx-access-ui.log-20170630.gz --limit 10
//! ```

use crate::config::Config;
use crate::error::{LogstatError, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Rank the slowest endpoints of an nginx access log
#[derive(Parser, Debug, Clone)]
#[command(name = "logstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file overriding the built-in defaults
    #[arg(long, global = true, env = "LOGSTAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug output, including every line that failed to parse
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to execute (defaults to `report`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write the HTML report for the newest log
    Report {
        /// Regenerate the report even if it already exists
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Print the slowest URLs to stdout
    Top {
        /// Analyze this file instead of the newest log in LOG_DIR
        #[arg(long)]
        log: Option<PathBuf>,

        /// Number of URLs to show (defaults to REPORT_SIZE)
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// The command to run, `report` when none was given
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Report { force: false })
    }
}

/// Apply `--limit` on top of the configured report size
pub fn apply_limit(config: Config, limit: Option<usize>) -> Result<Config> {
    match limit {
        None => Ok(config),
        Some(0) => Err(LogstatError::InvalidArgument(
            "--limit must be at least 1".to_string(),
        )),
        Some(report_size) => Ok(Config {
            report_size,
            ..config
        }),
    }
}

/// Whether a log given on the command line is gzipped, judged by extension
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("gz")
}
