//! Observability: tracing setup and the metrics recorder.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the tracing subscriber.
///
/// Filter resolution order: `LEXMON_LOG`, then `RUST_LOG`, then a default
/// of `lexmon=debug` (verbose) or `lexmon=info` (normal).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let default_directives = if verbose {
        "lexmon=debug,info"
    } else {
        "lexmon=info,warn"
    };

    let filter = std::env::var("LEXMON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(|_| EnvFilter::new(default_directives), EnvFilter::new);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .map_err(|e| Error::operation("init_tracing", e))
}

/// Installs the Prometheus metrics recorder and returns its render handle.
///
/// The handle is wired into the status server's `/metrics` route.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::operation("install_metrics_recorder", e))
}
