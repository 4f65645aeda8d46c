//! Configuration for benchmark runs.

use crate::boundary::DEFAULT_DEVICE;

/// Configuration options for [`Bench`](crate::Bench).
#[derive(Debug, Clone)]
pub struct Config {
    /// Repetitions per measurement run (default: 200,000).
    pub iterations: usize,

    /// Logical core the measuring thread is pinned to before a run
    /// (default: `Some(0)`). `None` skips pinning.
    pub pin_core: Option<usize>,

    /// Lock pages into memory before the first run (default: true), so
    /// no page fault lands inside a timed window.
    pub lock_memory: bool,

    /// Device node of the benchmark kernel module (default:
    /// `/dev/kvm-microbench`).
    pub device_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iterations: 200_000,
            pin_core: Some(0),
            lock_memory: true,
            device_path: DEFAULT_DEVICE.to_string(),
        }
    }
}
