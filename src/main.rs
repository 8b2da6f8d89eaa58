//! logstat - Rank the slowest endpoints of an nginx access log

use clap::Parser;
use logstat::{
    cli::{Cli, Command, apply_limit, is_gzip_path},
    config::Config,
    error::Result,
    log_finder::find_latest_log,
    output::get_formatter,
    pipeline::{ReportOutcome, analyze_log, generate_report},
};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber
///
/// `--quiet` and `--verbose` override `RUST_LOG`. With `LOG_FILE` set,
/// diagnostics go to that file instead of stderr.
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    let debug = cli.verbose || config.is_some_and(|c| c.debug);
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if debug {
        EnvFilter::new("logstat=debug,logstat_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("logstat=info,logstat_core=info"))
    };

    let (file_layer, stderr_layer) = match config.and_then(|c| c.log_file.as_deref()) {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

async fn run(cli: &Cli, config: Config) -> Result<()> {
    let interactive = !cli.quiet && is_terminal::is_terminal(std::io::stdout());

    match cli.command() {
        Command::Report { force } => {
            info!("Generating report from logs in {}", config.log_dir.display());
            match generate_report(&config, force, interactive).await? {
                ReportOutcome::Written(path) => info!("Done: {}", path.display()),
                ReportOutcome::AlreadyExists(path) => {
                    info!("The report {} has already been created", path.display())
                }
                ReportOutcome::NoLogs => info!("No logs to parse"),
            }
        }
        Command::Top { log, limit, json } => {
            let config = apply_limit(config, limit)?;
            let (path, compressed) = match log {
                Some(path) => {
                    let compressed = is_gzip_path(&path);
                    (path, compressed)
                }
                None => match find_latest_log(&config.log_dir)? {
                    Some(log) => (log.path, log.compressed),
                    None => {
                        info!("No logs to parse");
                        return Ok(());
                    }
                },
            };

            let analysis = analyze_log(&path, compressed, &config, interactive && !json).await?;
            let formatter = get_formatter(json);
            println!("{}", formatter.format_report(&analysis.rows, &analysis.stats));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging depends on the config, so a config error is reported through
    // the default subscriber.
    let config = Config::load(cli.config.as_deref());
    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Cannot open log file: {e}");
        return ExitCode::FAILURE;
    }

    let result = match config {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
