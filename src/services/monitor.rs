//! The monitor loop: drives rounds at a fixed period forever.

use super::fetch::{ContentFetcher, ItemLister};
use super::round::RoundCoordinator;
use crate::io::RoundLog;
use crate::models::RoundResult;
use crate::rendering::ChartRenderer;
use crate::series::TimeSeriesStore;
use crate::server::StatusState;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide control loop.
///
/// Owns the time series and the log sink; it is their only writer. Each
/// cycle waits one period, runs a round, appends the result to the series,
/// persists the log line, and re-renders the chart. Failures of the log
/// sink or the renderer are logged and never interrupt the cadence.
pub struct MonitorLoop<L, F, R> {
    coordinator: RoundCoordinator<L, F>,
    series: TimeSeriesStore,
    log: RoundLog,
    renderer: R,
    period: Duration,
    status: Option<Arc<StatusState>>,
}

impl<L, F, R> MonitorLoop<L, F, R>
where
    L: ItemLister,
    F: ContentFetcher,
    R: ChartRenderer,
{
    /// Creates a monitor loop over its collaborators.
    pub const fn new(
        coordinator: RoundCoordinator<L, F>,
        series: TimeSeriesStore,
        log: RoundLog,
        renderer: R,
        period: Duration,
    ) -> Self {
        Self {
            coordinator,
            series,
            log,
            renderer,
            period,
            status: None,
        }
    }

    /// Attaches shared status state updated after every round.
    #[must_use]
    pub fn with_status(mut self, status: Arc<StatusState>) -> Self {
        self.status = Some(status);
        self
    }

    /// The accumulated series (read-only).
    #[must_use]
    pub const fn series(&self) -> &TimeSeriesStore {
        &self.series
    }

    /// Runs forever at the configured period.
    pub async fn run(&mut self) {
        tracing::info!(period_secs = self.period.as_secs_f64(), "monitor loop started");
        loop {
            tokio::time::sleep(self.period).await;
            self.run_once().await;
        }
    }

    /// Runs one full cycle: round, append, persist, render.
    ///
    /// Recoverable failures (log write, render) are contained here and
    /// reported through tracing, per the propagation policy: no error
    /// crosses the round boundary and the cadence is never interrupted.
    pub async fn run_once(&mut self) -> RoundResult {
        let result = self.coordinator.run_round().await;

        // Axis spacing is the period expressed in minutes.
        let spacing = self.period.as_secs_f64() / 60.0;
        if let Err(err) = self.series.append(result.counts.clone(), spacing) {
            // Width mismatch cannot happen with a fixed lexicon.
            tracing::error!(error = %err, "series append failed");
        }

        if let Err(err) = self.log.append(chrono::Local::now(), &result.counts) {
            tracing::error!(path = %self.log.path().display(), error = %err, "round log write failed");
        }

        let labels = self.coordinator.lexicon().labels();
        if let Err(err) = self.renderer.render(&self.series, &labels) {
            tracing::error!(error = %err, "chart render failed");
        }

        if let Some(status) = &self.status {
            status.record_round(&result);
        }

        result
    }
}
