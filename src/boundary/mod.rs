//! The privilege boundary: request opcodes and the privileged-side
//! dispatch handler.
//!
//! A request carries `{raw opcode, repetitions}` across one synchronous
//! call; the privileged side runs the entire measurement loop inside that
//! call, computes the summary, logs it, and returns a status. The boundary
//! is crossed once per batch, never once per sample, so the cost of the
//! crossing cannot contaminate the per-operation distribution. Raw sample
//! buffers never cross the boundary; only summaries do.
//!
//! Two transports implement the same contract:
//! - [`DeviceClient`] issues ioctls against the benchmark character
//!   device backed by a kernel module (the module itself is external)
//! - [`SocketServer`] / [`SocketClient`] emulate the boundary with a
//!   separate privileged process and a Unix-socket request/response
//!   channel, useful where no kernel module is available

#[cfg(target_os = "linux")]
mod ioctl;
#[cfg(unix)]
mod socket;

#[cfg(target_os = "linux")]
pub use ioctl::DeviceClient;
#[cfg(unix)]
pub use socket::{SocketClient, SocketServer};

use std::error::Error;
use std::fmt;
use std::io;

use crate::measurement::{Driver, MeasureError, OpKind};
use crate::statistics::Summary;

/// Default device node created by the benchmark kernel module.
pub const DEFAULT_DEVICE: &str = "/dev/kvm-microbench";

/// ioctl command for a batched `vmcall` run: `_IOW('v', 1, unsigned long)`.
pub const IOCTL_RUN_VMCALL: libc::c_ulong = iow(1);

/// ioctl command for a batched `cpuid` run: `_IOW('v', 2, unsigned long)`.
pub const IOCTL_RUN_CPUID: libc::c_ulong = iow(2);

/// ioctl command for a batched `out 0xE9` run: `_IOW('v', 3, unsigned long)`.
pub const IOCTL_RUN_OUTB: libc::c_ulong = iow(3);

/// Compute `_IOW('v', nr, unsigned long)`.
///
/// dir=write (1) << 30 | size (8) << 16 | type ('v') << 8 | nr.
const fn iow(nr: u32) -> libc::c_ulong {
    ((1 << 30) | (8 << 16) | ((b'v' as u32) << 8) | nr) as libc::c_ulong
}

/// The ioctl command for an operation's batched run.
pub fn ioctl_for(op: OpKind) -> libc::c_ulong {
    match op {
        OpKind::Vmcall => IOCTL_RUN_VMCALL,
        OpKind::Cpuid => IOCTL_RUN_CPUID,
        OpKind::PortWrite => IOCTL_RUN_OUTB,
    }
}

/// Errors from the privileged-side dispatch handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The raw opcode names no operation in the closed set.
    UnknownOpcode(u32),
    /// The measurement itself failed.
    Measure(MeasureError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownOpcode(raw) => write!(f, "unknown opcode {}", raw),
            DispatchError::Measure(err) => write!(f, "measurement failed: {}", err),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatchError::Measure(err) => Some(err),
            DispatchError::UnknownOpcode(_) => None,
        }
    }
}

impl From<MeasureError> for DispatchError {
    fn from(err: MeasureError) -> Self {
        DispatchError::Measure(err)
    }
}

impl DispatchError {
    /// Negative status code reported across the boundary.
    pub fn status(&self) -> i32 {
        match self {
            // Mirrors the device's -EINVAL for an unknown command.
            DispatchError::UnknownOpcode(_) => -(libc::EINVAL),
            DispatchError::Measure(MeasureError::Unsupported(_)) => -(libc::EOPNOTSUPP),
            DispatchError::Measure(MeasureError::Store(_)) => -(libc::EINVAL),
        }
    }
}

/// Errors delivering a boundary request or receiving its response.
///
/// Distinguishes "the request never arrived" ([`TransportError::Open`],
/// [`TransportError::Request`], [`TransportError::Protocol`]) from "the
/// privileged side rejected it" ([`TransportError::Rejected`]); both name
/// the operation involved so operators can tell the cases apart.
#[derive(Debug)]
pub enum TransportError {
    /// The boundary endpoint could not be opened.
    Open {
        /// Path of the device node or socket.
        path: String,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The request for an operation failed in transit.
    Request {
        /// Operation whose request failed.
        op: OpKind,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The privileged side received the request and refused it.
    Rejected {
        /// Operation that was refused.
        op: OpKind,
        /// Negative status code it returned.
        status: i32,
        /// Optional human-readable reason from the privileged side.
        reason: Option<String>,
    },
    /// The response could not be decoded.
    Protocol {
        /// What went wrong with the exchange.
        detail: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Open { path, source } => {
                write!(f, "failed to open boundary endpoint {}: {}", path, source)
            }
            TransportError::Request { op, source } => {
                write!(f, "request for '{}' failed: {}", op, source)
            }
            TransportError::Rejected { op, status, reason } => {
                write!(f, "privileged side rejected '{}' with status {}", op, status)?;
                if let Some(reason) = reason {
                    write!(f, ": {}", reason)?;
                }
                Ok(())
            }
            TransportError::Protocol { detail } => write!(f, "protocol error: {}", detail),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Open { source, .. } | TransportError::Request { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Privileged-side handler for one boundary request.
///
/// Decodes the opcode, runs the full batch through `driver`, and returns
/// the computed summary. An unknown opcode performs no measurement and
/// leaves the driver's buffer untouched. Hosts map errors to negative
/// status codes via [`DispatchError::status`] and emit the summary
/// through their logging collaborator.
pub fn dispatch(driver: &mut Driver, raw_op: u32, reps: usize) -> Result<Summary, DispatchError> {
    let op = OpKind::from_raw(raw_op).ok_or(DispatchError::UnknownOpcode(raw_op))?;
    let store = driver.run(op, reps)?;
    Ok(Summary::from_store(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ioctl_codes_match_the_device_contract() {
        // _IOW('v', nr, unsigned long) with 'v' = 0x76.
        assert_eq!(IOCTL_RUN_VMCALL, 0x4008_7601);
        assert_eq!(IOCTL_RUN_CPUID, 0x4008_7602);
        assert_eq!(IOCTL_RUN_OUTB, 0x4008_7603);
    }

    #[test]
    fn unknown_opcode_performs_no_measurement() {
        let mut driver = Driver::new();
        let err = dispatch(&mut driver, 99, 10).unwrap_err();
        assert_eq!(err, DispatchError::UnknownOpcode(99));
        assert_eq!(err.status(), -(libc::EINVAL));
        assert!(driver.store().is_none());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn dispatch_runs_a_full_batch() {
        let mut driver = Driver::new();
        let summary = dispatch(&mut driver, OpKind::Cpuid.raw(), 32).unwrap();
        assert_eq!(summary.count, 32);
        assert!(summary.min <= summary.max);
    }
}
