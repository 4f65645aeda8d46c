//! Fixed-capacity sample storage with lazy-sort order statistics.
//!
//! [`SampleStore`] holds elapsed-cycle measurements in insertion order,
//! bounded by a capacity fixed at construction. The insertion path never
//! allocates or sorts, keeping it jitter-free inside a measurement loop.
//! Order statistics (median, percentiles) sort lazily: the store tracks a
//! sortedness flag so a batch of insertions pays for at most one sort,
//! regardless of how many queries follow.

use std::error::Error;
use std::fmt;

/// Errors from sample-store construction and insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// A store cannot be created with capacity zero.
    ZeroCapacity,
    /// The store is at capacity; the sample was not added.
    Full,
    /// A batch insert overflowed the store; only a prefix was accepted.
    Truncated {
        /// Number of values from the batch that were stored.
        accepted: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ZeroCapacity => write!(f, "sample store capacity must be non-zero"),
            StoreError::Full => write!(f, "sample store is full"),
            StoreError::Truncated { accepted } => {
                write!(f, "sample store full after accepting {} values", accepted)
            }
        }
    }
}

impl Error for StoreError {}

/// Fixed-capacity buffer of elapsed-cycle samples.
///
/// Invariants: `len() <= capacity()` always holds, and a failed insertion
/// leaves the store untouched. `is_sorted()` is true only immediately after
/// [`sort`](SampleStore::sort); any insertion invalidates it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStore {
    samples: Vec<u64>,
    capacity: usize,
    sorted: bool,
}

impl SampleStore {
    /// Create a store that can hold exactly `capacity` samples.
    ///
    /// The backing buffer is allocated up front so that no allocation
    /// happens on the insertion path.
    pub fn with_capacity(capacity: usize) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::ZeroCapacity);
        }
        Ok(Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            sorted: false,
        })
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples this store can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the samples are currently in ascending order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// The samples in their current order (insertion order, or ascending
    /// after a [`sort`](SampleStore::sort)).
    pub fn as_slice(&self) -> &[u64] {
        &self.samples
    }

    /// Append one sample.
    ///
    /// Fails with [`StoreError::Full`] at capacity; the store never grows.
    #[inline]
    pub fn add(&mut self, value: u64) -> Result<(), StoreError> {
        if self.samples.len() == self.capacity {
            return Err(StoreError::Full);
        }
        self.samples.push(value);
        self.sorted = false;
        Ok(())
    }

    /// Append a batch of samples.
    ///
    /// Accepts the longest prefix that fits. If the store fills before the
    /// batch is exhausted, the accepted prefix stays in place and the error
    /// reports how many values were stored.
    pub fn add_batch(&mut self, values: &[u64]) -> Result<(), StoreError> {
        for (i, &value) in values.iter().enumerate() {
            if self.add(value).is_err() {
                return Err(StoreError::Truncated { accepted: i });
            }
        }
        Ok(())
    }

    /// Discard all samples, retaining the allocation.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.sorted = false;
    }

    /// Sort the samples ascending.
    ///
    /// Idempotent: a no-op when already sorted or empty.
    pub fn sort(&mut self) {
        if !self.sorted && !self.samples.is_empty() {
            self.samples.sort_unstable();
            self.sorted = true;
        }
    }

    /// Smallest sample, or 0 on an empty store. Linear scan; does not sort.
    pub fn min(&self) -> u64 {
        self.samples.iter().copied().min().unwrap_or(0)
    }

    /// Largest sample, or 0 on an empty store. Linear scan; does not sort.
    pub fn max(&self) -> u64 {
        self.samples.iter().copied().max().unwrap_or(0)
    }

    /// Arithmetic mean, or 0.0 on an empty store.
    ///
    /// Accumulates in u128 so the sum cannot overflow for realistic sample
    /// counts and cycle magnitudes.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: u128 = self.samples.iter().map(|&v| v as u128).sum();
        sum as f64 / self.samples.len() as f64
    }

    /// Median, or 0.0 on an empty store. Sorts lazily.
    ///
    /// Even counts average the two central values; odd counts take the
    /// single central value.
    pub fn median(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sort();
        let n = self.samples.len();
        if n % 2 == 0 {
            (self.samples[n / 2 - 1] + self.samples[n / 2]) as f64 / 2.0
        } else {
            self.samples[n / 2] as f64
        }
    }

    /// Percentile with linear interpolation, or 0.0 on an empty store.
    ///
    /// `p` is clamped to [0, 100]. The continuous rank is
    /// `(p/100) * (count - 1)`; the result interpolates between the floor
    /// and ceiling indices using the fractional part of the rank, so
    /// `percentile(50.0)` on `[1, 2, 3, 4]` is 2.5. Sorts lazily.
    pub fn percentile(&mut self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let p = p.clamp(0.0, 100.0);
        self.sort();

        let n = self.samples.len();
        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank as usize;
        let upper = lower + 1;

        if upper >= n {
            self.samples[n - 1] as f64
        } else {
            let fraction = rank - lower as f64;
            let lo = self.samples[lower] as f64;
            let hi = self.samples[upper] as f64;
            lo + fraction * (hi - lo)
        }
    }

    /// Population variance (sum of squared deviations divided by count),
    /// or 0.0 on an empty store.
    pub fn variance(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum();
        sum_sq / self.samples.len() as f64
    }

    /// Population standard deviation, or 0.0 on an empty store.
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(values: &[u64]) -> SampleStore {
        let mut store = SampleStore::with_capacity(values.len()).unwrap();
        store.add_batch(values).unwrap();
        store
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(
            SampleStore::with_capacity(0).unwrap_err(),
            StoreError::ZeroCapacity
        );
    }

    #[test]
    fn add_beyond_capacity_fails_without_mutation() {
        let mut store = SampleStore::with_capacity(2).unwrap();
        store.add(1).unwrap();
        store.add(2).unwrap();
        assert_eq!(store.add(3), Err(StoreError::Full));
        assert_eq!(store.len(), 2);
        assert_eq!(store.as_slice(), &[1, 2]);
    }

    #[test]
    fn add_batch_reports_accepted_prefix() {
        let mut store = SampleStore::with_capacity(3).unwrap();
        let err = store.add_batch(&[10, 20, 30, 40, 50]).unwrap_err();
        assert_eq!(err, StoreError::Truncated { accepted: 3 });
        assert_eq!(store.as_slice(), &[10, 20, 30]);
    }

    #[test]
    fn sort_is_lazy_and_idempotent() {
        let mut store = store_with(&[3, 1, 2]);
        assert!(!store.is_sorted());
        store.sort();
        assert!(store.is_sorted());
        assert_eq!(store.as_slice(), &[1, 2, 3]);
        store.sort();
        assert_eq!(store.as_slice(), &[1, 2, 3]);

        // Any insertion invalidates the sorted flag.
        let mut store = SampleStore::with_capacity(4).unwrap();
        store.add_batch(&[3, 1, 2]).unwrap();
        store.sort();
        store.add(0).unwrap();
        assert!(!store.is_sorted());
    }

    #[test]
    fn reference_values_capacity_four() {
        let mut store = store_with(&[30, 10, 40, 20]);
        assert_eq!(store.min(), 10);
        assert_eq!(store.max(), 40);
        assert!((store.mean() - 25.0).abs() < 1e-12);
        assert!((store.median() - 25.0).abs() < 1e-12);
        assert!((store.percentile(50.0) - 25.0).abs() < 1e-12);
        assert!((store.percentile(0.0) - 10.0).abs() < 1e-12);
        assert!((store.percentile(100.0) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn constant_samples_have_zero_spread() {
        let store = store_with(&[5, 5, 5, 5, 5]);
        assert_eq!(store.variance(), 0.0);
        assert_eq!(store.stddev(), 0.0);
    }

    #[test]
    fn interpolated_median_on_even_count() {
        let mut store = store_with(&[1, 2, 3, 4]);
        assert!((store.percentile(50.0) - 2.5).abs() < 1e-12);
        assert!((store.median() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn odd_count_median_is_central_value() {
        let mut store = store_with(&[9, 1, 5]);
        assert!((store.median() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_clamps_out_of_range() {
        let mut store = store_with(&[10, 20, 30]);
        assert!((store.percentile(-5.0) - 10.0).abs() < 1e-12);
        assert!((store.percentile(250.0) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn empty_store_queries_return_zero() {
        let mut store = SampleStore::with_capacity(8).unwrap();
        assert_eq!(store.min(), 0);
        assert_eq!(store.max(), 0);
        assert_eq!(store.mean(), 0.0);
        assert_eq!(store.median(), 0.0);
        assert_eq!(store.percentile(95.0), 0.0);
        assert_eq!(store.variance(), 0.0);
        assert_eq!(store.stddev(), 0.0);
    }

    #[test]
    fn reset_retains_capacity() {
        let mut store = store_with(&[1, 2, 3]);
        store.sort();
        store.reset();
        assert!(store.is_empty());
        assert!(!store.is_sorted());
        assert_eq!(store.capacity(), 3);
        store.add(7).unwrap();
        assert_eq!(store.as_slice(), &[7]);
    }
}
