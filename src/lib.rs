//! # vmexit-bench
//!
//! Cycle-accurate microbenchmarks for virtualization exits.
//!
//! This crate measures the latency of individual privileged CPU
//! operations — trap-free `cpuid`, hypervisor-trapping `vmcall`, and an
//! `out` to port 0xE9 intercepted by the VMM — from user space or
//! delegated across a privilege boundary, reporting raw cycle
//! distributions:
//! - Paired serialized timestamp reads bracket exactly one instruction
//! - Samples land in a fixed-capacity, allocation-free buffer
//! - Order statistics (median, interpolated percentiles) sort lazily
//! - Privileged batches cross the boundary once per run, never per sample
//!
//! ## Quick Start
//!
//! ```ignore
//! use vmexit_bench::{output, Bench, OpKind};
//!
//! let mut bench = Bench::new().iterations(500_000).pin_to_core(0);
//! let summary = bench.run_user(OpKind::Cpuid)?;
//! println!("{}", output::format_detailed("CPUID (user)", &summary));
//! ```
//!
//! Interpretation is left to the caller: distributions are reported raw,
//! with no outlier rejection and no correction for frequency scaling or
//! SMI interference. Pin the measuring thread (the counter is per-core)
//! and keep hyperthread siblings quiet for trustworthy tails.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bench;
mod config;

pub mod boundary;
pub mod measurement;
pub mod output;
pub mod preflight;
pub mod statistics;

pub use bench::{Bench, BenchError};
pub use config::Config;
pub use measurement::{Driver, MeasureError, OpKind};
pub use statistics::{SampleStore, StoreError, Summary, PERCENTILES};
