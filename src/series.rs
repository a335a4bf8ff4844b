//! Bounded, append-only time series of round results.

use crate::{Error, Result};
use std::collections::VecDeque;

/// Default maximum number of retained samples.
pub const DEFAULT_CAPACITY: usize = 3000;

/// The accumulating history of round results with a derived relative time
/// axis.
///
/// The store is append-only and single-writer: only the monitor loop
/// mutates it, once per round. Growth is bounded by a capacity cap; the
/// oldest sample is evicted when the cap is reached. Running min/max
/// bounds cover every count ever appended, including evicted samples, so
/// the rendered axis range never shrinks.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    width: usize,
    capacity: usize,
    spacing: f64,
    samples: VecDeque<Vec<u64>>,
    min: u64,
    max: u64,
}

impl TimeSeriesStore {
    /// Creates an empty store for count vectors of the given width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `width` or `capacity` is zero.
    pub fn new(width: usize, capacity: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidInput(
                "series width must be at least one category".to_string(),
            ));
        }
        if capacity == 0 {
            return Err(Error::InvalidInput(
                "series capacity must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            width,
            capacity,
            spacing: 1.0,
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            min: 0,
            max: 0,
        })
    }

    /// Appends one round's counts with the given inter-sample spacing.
    ///
    /// The spacing applies to the whole axis: after the append the newest
    /// sample sits at time `0` and the i-th-from-newest at `-i * spacing`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the vector width does not match
    /// the store width.
    pub fn append(&mut self, counts: Vec<u64>, spacing: f64) -> Result<()> {
        if counts.len() != self.width {
            return Err(Error::InvalidInput(format!(
                "count vector width {} does not match series width {}",
                counts.len(),
                self.width
            )));
        }

        for &count in &counts {
            self.max = self.max.max(count);
            self.min = self.min.min(count);
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(counts);
        self.spacing = spacing;
        Ok(())
    }

    /// The relative time axis, oldest first.
    ///
    /// The newest sample is always at the reference point `0.0` and older
    /// samples recede negatively, so a renderer can show a fixed trailing
    /// window without tracking wall-clock time.
    #[must_use]
    pub fn axis(&self) -> Vec<f64> {
        let len = self.samples.len();
        (0..len)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let from_newest = (len - 1 - i) as f64;
                -from_newest * self.spacing
            })
            .collect()
    }

    /// The counts of one category across all retained samples, oldest
    /// first. Returns `None` for an out-of-range category index.
    #[must_use]
    pub fn series(&self, category: usize) -> Option<Vec<u64>> {
        if category >= self.width {
            return None;
        }
        Some(self.samples.iter().map(|sample| sample[category]).collect())
    }

    /// Running (minimum, maximum) over every count ever appended.
    ///
    /// Bounds only widen; eviction never narrows them.
    #[must_use]
    pub const fn bounds(&self) -> (u64, u64) {
        (self.min, self.max)
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The count vector width (number of categories).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&[u64]> {
        self.samples.back().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_invariant_after_n_appends() {
        let mut store = TimeSeriesStore::new(1, 100).unwrap();
        for n in 1..=5u64 {
            store.append(vec![n], 2.0).unwrap();
            let axis = store.axis();
            assert_eq!(axis.len(), usize::try_from(n).unwrap());
            assert!((axis[axis.len() - 1] - 0.0).abs() < f64::EPSILON);
            for (i, value) in axis.iter().rev().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let expected = -(i as f64) * 2.0;
                assert!((value - expected).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_sole_sample_reference_scenario() {
        let mut store = TimeSeriesStore::new(2, 10).unwrap();
        store.append(vec![1, 2], 1.0).unwrap();

        assert_eq!(store.axis(), vec![0.0]);
        assert_eq!(store.series(0), Some(vec![1]));
        assert_eq!(store.series(1), Some(vec![2]));
        assert_eq!(store.bounds(), (0, 2));
    }

    #[test]
    fn test_bounds_never_shrink() {
        let mut store = TimeSeriesStore::new(1, 2).unwrap();
        store.append(vec![9], 1.0).unwrap();
        assert_eq!(store.bounds(), (0, 9));

        // Evict the 9; bounds must stay.
        store.append(vec![1], 1.0).unwrap();
        store.append(vec![1], 1.0).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.bounds(), (0, 9));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = TimeSeriesStore::new(1, 3).unwrap();
        for n in 1..=5u64 {
            store.append(vec![n], 1.0).unwrap();
        }
        assert_eq!(store.series(0), Some(vec![3, 4, 5]));
        assert_eq!(store.latest(), Some(&[5u64][..]));
    }

    #[test]
    fn test_append_rejects_wrong_width() {
        let mut store = TimeSeriesStore::new(2, 10).unwrap();
        let result = store.append(vec![1], 1.0);
        assert!(matches!(result, Err(crate::Error::InvalidInput(_))));
    }

    #[test]
    fn test_series_out_of_range() {
        let store = TimeSeriesStore::new(2, 10).unwrap();
        assert!(store.series(2).is_none());
    }
}
