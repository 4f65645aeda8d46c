//! Main `Bench` entry point and builder.

use std::error::Error;
use std::fmt;
use std::io;

use crate::boundary::TransportError;
#[cfg(target_os = "linux")]
use crate::boundary::DeviceClient;
use crate::config::Config;
use crate::measurement::{Driver, MeasureError, OpKind};
#[cfg(target_os = "linux")]
use crate::preflight;
use crate::statistics::{SampleStore, Summary};

/// Errors from a benchmark run.
#[derive(Debug)]
pub enum BenchError {
    /// The measurement loop failed.
    Measure(MeasureError),
    /// The privileged boundary failed.
    Transport(TransportError),
    /// A required environment precondition could not be established.
    Preflight {
        /// Which precondition failed.
        what: &'static str,
        /// Underlying OS error.
        source: io::Error,
    },
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Measure(err) => write!(f, "{}", err),
            BenchError::Transport(err) => write!(f, "{}", err),
            BenchError::Preflight { what, source } => write!(f, "{}: {}", what, source),
        }
    }
}

impl Error for BenchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BenchError::Measure(err) => Some(err),
            BenchError::Transport(err) => Some(err),
            BenchError::Preflight { source, .. } => Some(source),
        }
    }
}

impl From<MeasureError> for BenchError {
    fn from(err: MeasureError) -> Self {
        BenchError::Measure(err)
    }
}

impl From<TransportError> for BenchError {
    fn from(err: TransportError) -> Self {
        BenchError::Transport(err)
    }
}

/// Entry point for running exit-latency benchmarks.
///
/// Use the builder methods to configure, then [`run_user`](Bench::run_user)
/// for in-process measurement or [`run_delegated`](Bench::run_delegated)
/// to hand one batch to the privileged side.
///
/// # Example
///
/// ```ignore
/// use vmexit_bench::{Bench, OpKind};
///
/// let mut bench = Bench::new().iterations(500_000).pin_to_core(0);
/// let summary = bench.run_user(OpKind::Cpuid)?;
/// println!("{}", vmexit_bench::output::format_detailed("cpuid", &summary));
/// ```
#[derive(Debug, Default)]
pub struct Bench {
    config: Config,
    driver: Driver,
    prepared: bool,
    #[cfg(target_os = "linux")]
    device: Option<DeviceClient>,
}

impl Bench {
    /// Create a bench with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a bench from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set repetitions per run.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Pin the measuring thread to one logical core before running.
    pub fn pin_to_core(mut self, core: usize) -> Self {
        self.config.pin_core = Some(core);
        self
    }

    /// Skip core pinning.
    pub fn no_pinning(mut self) -> Self {
        self.config.pin_core = None;
        self
    }

    /// Enable or disable memory locking before the first run.
    pub fn lock_memory(mut self, lock: bool) -> Self {
        self.config.lock_memory = lock;
        self
    }

    /// Set the benchmark device node for delegated runs.
    pub fn device_path(mut self, path: impl Into<String>) -> Self {
        self.config.device_path = path.into();
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Measure one operation in the current process.
    ///
    /// Applies pinning and memory locking on the first run (failures are
    /// reported to stderr and measurement proceeds; both are
    /// best-effort outside privileged environments, as are the numbers
    /// you get without them). Port access for the `out 0xE9` probe is
    /// mandatory and fails the run if refused.
    pub fn run_user(&mut self, op: OpKind) -> Result<Summary, BenchError> {
        self.prepare();

        #[cfg(target_os = "linux")]
        if op == OpKind::PortWrite {
            preflight::request_port_access(crate::measurement::INTERCEPTED_PORT).map_err(
                |source| BenchError::Preflight {
                    what: "I/O port access (requires root)",
                    source,
                },
            )?;
        }
        #[cfg(not(target_os = "linux"))]
        if op == OpKind::PortWrite {
            return Err(BenchError::Measure(MeasureError::Unsupported(op)));
        }

        let store = self.driver.run(op, self.config.iterations)?;
        Ok(Summary::from_store(store))
    }

    /// Raw samples from the most recent user-space run.
    pub fn samples(&self) -> Option<&SampleStore> {
        self.driver.store()
    }

    /// Delegate one batched run to the privileged side via the benchmark
    /// device node.
    ///
    /// The device performs all repetitions inside the single request and
    /// reports its statistics to the kernel log; only the status comes
    /// back.
    #[cfg(target_os = "linux")]
    pub fn run_delegated(&mut self, op: OpKind) -> Result<(), BenchError> {
        let device = match self.device {
            Some(ref device) => device,
            ref mut slot => slot.insert(DeviceClient::open(&self.config.device_path)?),
        };
        device.run(op, self.config.iterations)?;
        Ok(())
    }

    fn prepare(&mut self) {
        if self.prepared {
            return;
        }
        self.prepared = true;

        #[cfg(target_os = "linux")]
        {
            if let Some(core) = self.config.pin_core {
                if let Err(err) = preflight::pin_to_core(core) {
                    eprintln!("warning: could not pin to core {}: {}", core, err);
                }
            }
            if self.config.lock_memory {
                if let Err(err) = preflight::lock_memory() {
                    eprintln!("warning: could not lock memory: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_updates_config() {
        let bench = Bench::new()
            .iterations(1000)
            .pin_to_core(2)
            .lock_memory(false)
            .device_path("/dev/test-bench");
        assert_eq!(bench.config().iterations, 1000);
        assert_eq!(bench.config().pin_core, Some(2));
        assert!(!bench.config().lock_memory);
        assert_eq!(bench.config().device_path, "/dev/test-bench");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn user_run_produces_summary() {
        let mut bench = Bench::new().iterations(64).no_pinning().lock_memory(false);
        let summary = bench.run_user(OpKind::Cpuid).unwrap();
        assert_eq!(summary.count, 64);
        assert!(summary.min <= summary.max);
        assert_eq!(bench.samples().unwrap().len(), 64);
    }
}
