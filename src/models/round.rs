//! Round-scoped types: item handles, worker outcomes, round results.

/// Opaque reference to one unit of remote content, produced fresh by the
/// lister each round.
///
/// Handles carry whatever the lister extracted (typically a relative URL
/// fragment); no identity persists across rounds and handles are never
/// deduplicated or cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemHandle(String);

impl ItemHandle {
    /// Wraps a raw handle string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw handle string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal outcome of one sampling worker.
///
/// `Skipped` is reported when the retry budget is exhausted; it is
/// deliberately distinguishable from an item that fetched fine and simply
/// matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The item was fetched, decoded, and its counts were folded into the
    /// round aggregate.
    Scored,
    /// The item was abandoned after exhausting its retry budget.
    Skipped,
}

/// The aggregated per-category count vector produced by one round.
///
/// Always well-formed: the counts vector has exactly one entry per lexicon
/// category, in lexicon order, even when the round listed zero items.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// Sum of category matches across all items scored this round, in
    /// lexicon order.
    pub counts: Vec<u64>,
    /// Number of items the lister reported for this round.
    pub items_listed: usize,
    /// Number of items that were fetched and scored.
    pub items_scored: usize,
    /// Number of items abandoned after exhausting their retry budget or
    /// still in flight when the round deadline elapsed.
    pub items_skipped: usize,
}

impl RoundResult {
    /// An all-zero result of the given width, for rounds with no items.
    #[must_use]
    pub fn empty(width: usize) -> Self {
        Self {
            counts: vec![0; width],
            items_listed: 0,
            items_scored: 0,
            items_skipped: 0,
        }
    }

    /// Total matches across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_width() {
        let result = RoundResult::empty(3);
        assert_eq!(result.counts, vec![0, 0, 0]);
        assert_eq!(result.total(), 0);
        assert_eq!(result.items_listed, 0);
    }

    #[test]
    fn test_total_sums_categories() {
        let result = RoundResult {
            counts: vec![1, 2, 4],
            items_listed: 3,
            items_scored: 3,
            items_skipped: 0,
        };
        assert_eq!(result.total(), 7);
    }
}
