//! Derived statistics snapshots.

use serde::{Deserialize, Serialize};

use super::store::SampleStore;

/// Percentiles reported by the detailed-statistics view.
pub const PERCENTILES: [f64; 7] = [1.0, 5.0, 25.0, 50.0, 75.0, 95.0, 99.0];

/// Detailed statistics computed from one sample store.
///
/// A pure projection: nothing here refers back to the store, so summaries
/// can cross a privilege boundary while the raw buffer stays behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Number of samples the snapshot was computed from.
    pub count: usize,
    /// Smallest elapsed-cycle sample.
    pub min: u64,
    /// Largest elapsed-cycle sample.
    pub max: u64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (even counts average the central pair).
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Population variance.
    pub variance: f64,
    /// Values at [`PERCENTILES`], in the same order.
    pub percentiles: [f64; 7],
}

impl Summary {
    /// Compute a snapshot of `store`.
    ///
    /// Sorts the store lazily for the order statistics; the sample count
    /// and contents are unchanged. Valid on an empty store, where every
    /// field is zero.
    pub fn from_store(store: &mut SampleStore) -> Self {
        let mut percentiles = [0.0; 7];
        for (slot, &p) in percentiles.iter_mut().zip(PERCENTILES.iter()) {
            *slot = store.percentile(p);
        }
        Self {
            count: store.len(),
            min: store.min(),
            max: store.max(),
            mean: store.mean(),
            median: store.median(),
            std_dev: store.stddev(),
            variance: store.variance(),
            percentiles,
        }
    }
}
