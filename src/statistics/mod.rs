//! Sample storage and order statistics.
//!
//! This module provides the statistics engine behind every measurement:
//! - [`SampleStore`] - fixed-capacity elapsed-cycle buffer with a
//!   lazy-sort cache (one sort per batch of insertions, not per query)
//! - [`Summary`] - detailed-statistics snapshot with the fixed
//!   percentile set reported by the benchmarks
//!
//! Percentiles use continuous-rank linear interpolation and variance is
//! population variance; both formulas are fixed and nothing here trims
//! outliers or estimates confidence intervals.

mod store;
mod summary;

pub use store::{SampleStore, StoreError};
pub use summary::{Summary, PERCENTILES};
