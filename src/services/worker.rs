//! Sampling worker: fetch one item with bounded retries, score it, and
//! fold the counts into the round aggregate.

use super::fetch::ContentFetcher;
use crate::config::FetchConfig;
use crate::models::{ItemHandle, ItemOutcome, Lexicon};
use crate::scanner::score;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Bounded retry policy for transient fetch failures.
///
/// Every failure class (timeout, transport, status, decode) is treated as
/// transient and retried with a fixed backoff until the attempt budget is
/// spent; exhaustion surfaces as an explicit skip, never as a zero score.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum fetch attempts per item (at least 1).
    pub max_attempts: u32,
    /// Fixed sleep between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Derives the policy from the fetch configuration.
    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Samples one item: fetch with retries, score, aggregate, signal.
///
/// Exactly one completion signal is sent on every path. The send result is
/// ignored because the coordinator may have abandoned the round at its
/// deadline and dropped the receiver; the worker's work is still valid
/// (its counts were added atomically before the signal).
pub(super) async fn sample_item<F: ContentFetcher>(
    fetcher: Arc<F>,
    item: ItemHandle,
    lexicon: Arc<Lexicon>,
    counters: Arc<[AtomicU64]>,
    policy: RetryPolicy,
    done: mpsc::Sender<ItemOutcome>,
) {
    let outcome = fetch_and_score(&*fetcher, &item, &lexicon, &counters, policy).await;
    let _ = done.send(outcome).await;
}

async fn fetch_and_score<F: ContentFetcher>(
    fetcher: &F,
    item: &ItemHandle,
    lexicon: &Lexicon,
    counters: &[AtomicU64],
    policy: RetryPolicy,
) -> ItemOutcome {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        metrics::counter!("lexmon_fetch_attempts_total").increment(1);

        match fetcher.fetch(item).await {
            Ok(text) => {
                let counts = score(&text, lexicon);
                for (counter, count) in counters.iter().zip(&counts) {
                    counter.fetch_add(*count, Ordering::Relaxed);
                }
                tracing::debug!(
                    item = %item,
                    attempt,
                    matches = counts.iter().sum::<u64>(),
                    "item scored"
                );
                return ItemOutcome::Scored;
            },
            Err(err) => {
                tracing::warn!(item = %item, attempt, error = %err, "fetch failed");
                if attempt < max_attempts {
                    metrics::counter!("lexmon_fetch_retries_total").increment(1);
                    if !policy.backoff.is_zero() {
                        tokio::time::sleep(policy.backoff).await;
                    }
                }
            },
        }
    }

    metrics::counter!("lexmon_items_skipped_total").increment(1);
    tracing::warn!(item = %item, attempts = max_attempts, "retry budget exhausted, skipping item");
    ItemOutcome::Skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::services::fetch::FetchError;
    use std::sync::atomic::AtomicU32;

    /// Fetcher that fails a fixed number of times, then succeeds.
    struct FlakyFetcher {
        failures: AtomicU32,
        body: &'static str,
    }

    impl ContentFetcher for FlakyFetcher {
        async fn fetch(&self, _item: &ItemHandle) -> Result<String, FetchError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            Ok(self.body.to_string())
        }
    }

    fn test_lexicon() -> Arc<Lexicon> {
        Arc::new(
            Lexicon::new(vec![
                Category::new("A", ["cat"]).unwrap(),
                Category::new("B", ["dog"]).unwrap(),
            ])
            .unwrap(),
        )
    }

    fn zero_counters(width: usize) -> Arc<[AtomicU64]> {
        (0..width).map(|_| AtomicU64::new(0)).collect()
    }

    fn snapshot(counters: &[AtomicU64]) -> Vec<u64> {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    #[tokio::test]
    async fn test_retry_then_success_signals_once() {
        let lexicon = test_lexicon();
        let counters = zero_counters(lexicon.len());
        let fetcher = Arc::new(FlakyFetcher {
            failures: AtomicU32::new(2),
            body: "cat and dog and dog",
        });
        let (tx, mut rx) = mpsc::channel(1);

        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Duration::ZERO,
        };
        sample_item(
            fetcher,
            ItemHandle::new("/post/1"),
            Arc::clone(&lexicon),
            Arc::clone(&counters),
            policy,
            tx,
        )
        .await;

        // Exactly one completion, and counts reflect one scoring, not three.
        assert_eq!(rx.recv().await, Some(ItemOutcome::Scored));
        assert_eq!(rx.recv().await, None);
        assert_eq!(snapshot(&counters), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_skip() {
        let lexicon = test_lexicon();
        let counters = zero_counters(lexicon.len());
        let fetcher = Arc::new(FlakyFetcher {
            failures: AtomicU32::new(10),
            body: "cat",
        });
        let (tx, mut rx) = mpsc::channel(1);

        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        };
        sample_item(
            fetcher,
            ItemHandle::new("/post/2"),
            Arc::clone(&lexicon),
            Arc::clone(&counters),
            policy,
            tx,
        )
        .await;

        assert_eq!(rx.recv().await, Some(ItemOutcome::Skipped));
        assert_eq!(snapshot(&counters), vec![0, 0]);
    }

    #[tokio::test]
    async fn test_signal_sent_even_when_receiver_dropped() {
        let lexicon = test_lexicon();
        let counters = zero_counters(lexicon.len());
        let fetcher = Arc::new(FlakyFetcher {
            failures: AtomicU32::new(0),
            body: "dog",
        });
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        // Must not panic; counts still land.
        sample_item(
            fetcher,
            ItemHandle::new("/post/3"),
            Arc::clone(&lexicon),
            Arc::clone(&counters),
            RetryPolicy {
                max_attempts: 1,
                backoff: Duration::ZERO,
            },
            tx,
        )
        .await;
        assert_eq!(snapshot(&counters), vec![0, 1]);
    }
}
