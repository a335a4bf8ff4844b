//! Round coordinator: one full sampling cycle over the current item set.

use super::fetch::{ContentFetcher, ItemLister};
use super::worker::{RetryPolicy, sample_item};
use crate::models::{ItemOutcome, Lexicon, RoundResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Orchestrates one sampling round.
///
/// Lists the current items once, spawns one worker per item (fan-out width
/// equals the item-set size, unbounded), and waits until a completion
/// signal has been received for every worker or the round deadline
/// elapses. The wait is deterministic on signal count, so a quiet round
/// finishes as soon as the last worker reports rather than after a fixed
/// sleep, and abandoning the round at the deadline drops the receiver so
/// straggler signals cannot leak into the next round.
pub struct RoundCoordinator<L, F> {
    lister: L,
    fetcher: Arc<F>,
    lexicon: Arc<Lexicon>,
    resource: String,
    policy: RetryPolicy,
    round_timeout: Duration,
}

impl<L, F> RoundCoordinator<L, F>
where
    L: ItemLister,
    F: ContentFetcher,
{
    /// Creates a coordinator over the given collaborators.
    pub fn new(
        lister: L,
        fetcher: Arc<F>,
        lexicon: Arc<Lexicon>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            lister,
            fetcher,
            lexicon,
            resource: resource.into(),
            policy: RetryPolicy::default(),
            round_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the worker retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the round deadline.
    #[must_use]
    pub const fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// The lexicon this coordinator scores against.
    #[must_use]
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Runs one complete sampling round.
    ///
    /// Never fails: a lister failure degrades to an empty item set
    /// (logged), and the result is always a well-formed count vector of
    /// lexicon width. Items whose workers exhausted their retry budget, or
    /// that were still in flight at the deadline, are tallied as skipped.
    pub async fn run_round(&self) -> RoundResult {
        let started = Instant::now();
        metrics::counter!("lexmon_rounds_total").increment(1);

        let items = match self.lister.list(&self.resource).await {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(resource = %self.resource, error = %err, "listing failed, degrading to empty round");
                metrics::counter!("lexmon_list_failures_total").increment(1);
                Vec::new()
            },
        };

        let width = self.lexicon.len();
        let total = items.len();
        if total == 0 {
            return RoundResult::empty(width);
        }

        // The only concurrently mutated state of the round: one atomic
        // counter per category, shared by all workers.
        let counters: Arc<[AtomicU64]> = (0..width).map(|_| AtomicU64::new(0)).collect();
        let (done_tx, mut done_rx) = mpsc::channel(total);

        for item in items {
            tokio::spawn(sample_item(
                Arc::clone(&self.fetcher),
                item,
                Arc::clone(&self.lexicon),
                Arc::clone(&counters),
                self.policy,
                done_tx.clone(),
            ));
        }
        drop(done_tx);

        let deadline = tokio::time::Instant::now() + self.round_timeout;
        let mut scored = 0usize;
        let mut skipped = 0usize;
        let mut received = 0usize;

        while received < total {
            match tokio::time::timeout_at(deadline, done_rx.recv()).await {
                Ok(Some(ItemOutcome::Scored)) => {
                    received += 1;
                    scored += 1;
                },
                Ok(Some(ItemOutcome::Skipped)) => {
                    received += 1;
                    skipped += 1;
                },
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        outstanding = total - received,
                        "round deadline elapsed, abandoning in-flight items"
                    );
                    metrics::counter!("lexmon_round_deadline_total").increment(1);
                    break;
                },
            }
        }
        // Receiver drops here; straggler sends fail harmlessly.
        drop(done_rx);

        let counts: Vec<u64> = counters.iter().map(|c| c.load(Ordering::Relaxed)).collect();
        let result = RoundResult {
            counts,
            items_listed: total,
            items_scored: scored,
            items_skipped: skipped + (total - received),
        };

        metrics::histogram!("lexmon_round_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            listed = result.items_listed,
            scored = result.items_scored,
            skipped = result.items_skipped,
            matches = result.total(),
            "round complete"
        );
        result
    }
}
