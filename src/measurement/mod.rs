//! Measurement infrastructure.
//!
//! This module provides:
//! - The paired-timestamp protocol ([`tsc_start`] / [`tsc_end`]) with
//!   asymmetric serialization: a full barrier opens the window, a
//!   retire-fence closes it
//! - The closed probe set ([`OpKind`]): trap-free `cpuid`, trapping
//!   `vmcall`, and the intercepted `out 0xE9`
//! - The [`Driver`] that repeats start/probe/end/append for N iterations
//!   into a fixed-capacity store, reusing its buffer across runs of the
//!   same size class
//!
//! The counter is per-core; pin the measuring thread first (see
//! [`crate::preflight`]). Everything in the timed window is
//! allocation-free and lock-free.

mod driver;
mod probe;
mod timer;

pub use driver::{Driver, MeasureError};
pub use probe::{OpKind, INTERCEPTED_PORT, PORT_PAYLOAD};
pub use timer::{black_box, cycles_per_ns, tsc_end, tsc_start};
