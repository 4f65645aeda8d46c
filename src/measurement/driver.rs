//! Measurement driver: the timed loop and its buffer management.

use std::error::Error;
use std::fmt;

use crate::statistics::{SampleStore, StoreError};

use super::probe::{self, OpKind};
use super::timer;

/// Errors from a measurement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    /// The selected operation cannot execute on this target.
    Unsupported(OpKind),
    /// Sample-store failure (zero repetitions, or an overfull buffer).
    Store(StoreError),
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureError::Unsupported(op) => {
                write!(f, "operation '{}' is not supported on this target", op)
            }
            MeasureError::Store(err) => write!(f, "sample store: {}", err),
        }
    }
}

impl Error for MeasureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MeasureError::Store(err) => Some(err),
            MeasureError::Unsupported(_) => None,
        }
    }
}

impl From<StoreError> for MeasureError {
    fn from(err: StoreError) -> Self {
        MeasureError::Store(err)
    }
}

/// Runs measurement loops and owns the sample buffer between runs.
///
/// The driver is stateless across runs apart from the buffer: a run whose
/// repetition count fits the previous run's capacity reuses the same
/// allocation with the count reset to zero, so back-to-back runs of one
/// size class pay for a single allocation.
#[derive(Debug, Default)]
pub struct Driver {
    store: Option<SampleStore>,
    allocations: usize,
}

impl Driver {
    /// Create a driver with no buffer; the first run allocates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sample-buffer allocations performed so far.
    ///
    /// Lets callers (and tests) observe that repeated runs of the same
    /// size class do not reallocate.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Measure `op` for `reps` repetitions.
    ///
    /// Each iteration brackets exactly one execution of the operation
    /// with the paired-timestamp protocol and appends the delta; nothing
    /// else happens in the timed window. Returns the filled store.
    ///
    /// Fails with [`MeasureError::Unsupported`] before taking any
    /// timestamp if the probe cannot execute here, and with
    /// `StoreError::ZeroCapacity` for `reps == 0`.
    pub fn run(&mut self, op: OpKind, reps: usize) -> Result<&mut SampleStore, MeasureError> {
        if !op.supported() {
            return Err(MeasureError::Unsupported(op));
        }
        let store = self.acquire(reps)?;

        for _ in 0..reps {
            let start = timer::tsc_start();
            probe::execute(op);
            let end = timer::tsc_end();
            // Counter wrap over realistic uptimes is ignored.
            store.add(end.wrapping_sub(start))?;
        }

        Ok(store)
    }

    /// The store from the most recent run, if any.
    pub fn store(&self) -> Option<&SampleStore> {
        self.store.as_ref()
    }

    fn acquire(&mut self, reps: usize) -> Result<&mut SampleStore, StoreError> {
        let reusable = matches!(self.store, Some(ref store) if reps > 0 && store.capacity() >= reps);
        if reusable {
            let store = self.store.as_mut().unwrap();
            store.reset();
            Ok(store)
        } else {
            let store = SampleStore::with_capacity(reps)?;
            self.allocations += 1;
            Ok(self.store.insert(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_repetitions_rejected() {
        let mut driver = Driver::new();
        assert_eq!(
            driver.run(OpKind::Cpuid, 0),
            Err(MeasureError::Store(StoreError::ZeroCapacity))
        );
        assert_eq!(driver.allocations(), 0);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn run_fills_store_to_exactly_reps() {
        let mut driver = Driver::new();
        let store = driver.run(OpKind::Cpuid, 64).unwrap();
        assert_eq!(store.len(), 64);
        assert_eq!(store.capacity(), 64);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn smaller_second_run_reuses_buffer() {
        let mut driver = Driver::new();
        driver.run(OpKind::Cpuid, 128).unwrap();
        assert_eq!(driver.allocations(), 1);

        let store = driver.run(OpKind::Cpuid, 32).unwrap();
        assert_eq!(store.len(), 32);
        assert_eq!(driver.allocations(), 1);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn larger_second_run_allocates_fresh() {
        let mut driver = Driver::new();
        driver.run(OpKind::Cpuid, 16).unwrap();
        driver.run(OpKind::Cpuid, 256).unwrap();
        assert_eq!(driver.allocations(), 2);
        assert_eq!(driver.store().unwrap().capacity(), 256);
    }

    #[cfg(not(target_arch = "x86_64"))]
    #[test]
    fn unsupported_target_leaves_store_untouched() {
        let mut driver = Driver::new();
        assert_eq!(
            driver.run(OpKind::Cpuid, 8),
            Err(MeasureError::Unsupported(OpKind::Cpuid))
        );
        assert!(driver.store().is_none());
    }
}
