//! Binary entry point for lexmon.
//!
//! This binary provides the CLI interface for the lexmon keyword-trend
//! monitor.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in the main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexmon::config::LexmonConfig;
use lexmon::io::RoundLog;
use lexmon::rendering::SvgChart;
use lexmon::server::{StatusServer, StatusState};
use lexmon::services::{HttpFetcher, HttpLister, MonitorLoop, RoundCoordinator, RetryPolicy};
use lexmon::{TimeSeriesStore, observability, score};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Lexmon - keyword-trend monitor for remote text feeds.
#[derive(Parser)]
#[command(name = "lexmon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the monitor loop.
    Run {
        /// Name of the resource to monitor.
        resource: Option<String>,

        /// Sampling period in seconds.
        #[arg(short, long)]
        period: Option<f64>,

        /// Round log path (default: <RESOURCE>.dat).
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Status server listen address.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Score local text against the configured lexicon.
    Score {
        /// Path to a text file (reads stdin when omitted).
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Manage configuration.
    Config {
        /// Show the effective configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; ignore a missing file.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = observability::init_tracing(cli.verbose) {
        eprintln!("Failed to initialize tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> anyhow::Result<LexmonConfig> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        let config = LexmonConfig::load_from_file(std::path::Path::new(config_path))
            .with_context(|| format!("reading {config_path}"))?;
        return Ok(config.with_env_overrides());
    }

    // Environment override for config path
    if let Ok(config_path) = std::env::var("LEXMON_CONFIG_PATH")
        && !config_path.trim().is_empty()
    {
        let config = LexmonConfig::load_from_file(std::path::Path::new(&config_path))
            .with_context(|| format!("reading {config_path}"))?;
        return Ok(config.with_env_overrides());
    }

    // Otherwise, load from default location
    Ok(LexmonConfig::load_default().with_env_overrides())
}

/// Runs the selected command.
async fn run_command(command: Commands, config: LexmonConfig) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            resource,
            period,
            log,
            listen,
        } => cmd_run(config, resource, period, log, listen).await,

        Commands::Score { file } => cmd_score(&config, file),

        Commands::Config { show } => cmd_config(&config, show),
    }
}

/// Run command: the monitor daemon.
async fn cmd_run(
    mut config: LexmonConfig,
    resource: Option<String>,
    period: Option<f64>,
    log: Option<PathBuf>,
    listen: Option<String>,
) -> anyhow::Result<()> {
    if let Some(resource) = resource {
        config = config.with_resource(resource);
    }
    if let Some(period) = period {
        config = config.with_period_secs(period);
    }
    if let Some(log) = log {
        config = config.with_log_path(log);
    }
    if let Some(listen) = listen {
        config = config.with_listen_addr(listen);
    }

    let lexicon = Arc::new(config.build_lexicon()?);
    tracing::info!(
        resource = %config.resource,
        categories = lexicon.len(),
        period_secs = config.period_secs,
        "starting monitor"
    );

    // The one fatal resource acquisition: the round log.
    let round_log = RoundLog::open(config.log_path())
        .with_context(|| format!("opening round log {}", config.log_path().display()))?;

    let lister = HttpLister::new(config.base_url.clone(), &config.fetch)?;
    let fetcher = Arc::new(HttpFetcher::new(config.base_url.clone(), &config.fetch));
    let coordinator = RoundCoordinator::new(lister, fetcher, Arc::clone(&lexicon), &config.resource)
        .with_retry_policy(RetryPolicy::from_config(&config.fetch))
        .with_round_timeout(config.round_timeout());

    let series = TimeSeriesStore::new(lexicon.len(), config.series_capacity)?;
    let renderer = SvgChart::new(config.chart_path(), config.resource.clone())
        .with_threshold(config.alert_threshold);

    let status = Arc::new(StatusState::new(
        config.resource.clone(),
        lexicon.labels().iter().map(ToString::to_string).collect(),
    ));

    // The status server is peripheral: a bind failure is reported but the
    // sampling loop still runs.
    let mut server =
        StatusServer::new(config.listen_addr.clone(), Arc::clone(&status), config.chart_path());
    match observability::install_metrics_recorder() {
        Ok(handle) => server = server.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "metrics recorder unavailable"),
    }
    tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            tracing::error!(error = %e, "status server failed");
        }
    });

    let mut monitor = MonitorLoop::new(
        coordinator,
        series,
        round_log,
        renderer,
        Duration::from_secs_f64(config.period_secs.max(0.1)),
    )
    .with_status(status);

    monitor.run().await;
    Ok(())
}

/// Score command: one-shot scoring of local text.
fn cmd_score(config: &LexmonConfig, file: Option<PathBuf>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        },
    };

    let lexicon = config.build_lexicon()?;
    let counts = score(&text, &lexicon);

    for (category, count) in lexicon.iter().zip(&counts) {
        println!("{}\t{count}", category.label());
    }

    Ok(())
}

/// Config command.
fn cmd_config(config: &LexmonConfig, show: bool) -> anyhow::Result<()> {
    if show {
        println!("Current Configuration");
        println!("=====================");
        println!();
        println!("Resource: {}", config.resource);
        println!("Base URL: {}", config.base_url);
        println!("Period: {}s", config.period_secs);
        println!("Round Log: {}", config.log_path().display());
        println!("Chart: {}", config.chart_path().display());
        println!("Listen Address: {}", config.listen_addr);
        println!("Series Capacity: {}", config.series_capacity);
        println!("Alert Threshold: {}", config.alert_threshold);
        println!();
        println!("Fetch:");
        println!("  Timeout: {}ms", config.fetch.timeout_ms);
        println!("  Backoff: {}ms", config.fetch.backoff_ms);
        println!("  Max Attempts: {}", config.fetch.max_attempts);
        println!("  Fallback Charset: {}", config.fetch.fallback_charset);
        println!("  Item Pattern: {}", config.fetch.item_pattern);
        println!();
        println!("Lexicon:");
        let lexicon = config.build_lexicon()?;
        for category in &lexicon {
            println!("  {}: {}", category.label(), category.keywords().join(", "));
        }
    } else {
        println!("Use --show to display configuration");
    }

    Ok(())
}
