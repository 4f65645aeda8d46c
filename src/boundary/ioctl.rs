//! Character-device transport for the privileged boundary.
//!
//! The benchmark kernel module registers a device node (default
//! `/dev/kvm-microbench`) whose ioctl handler runs one batched
//! measurement per call and prints the summary to the kernel log. This
//! client only opens the node and issues requests; registration and
//! teardown of the device are the module's concern.

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

use crate::measurement::OpKind;

use super::{ioctl_for, TransportError};

/// Client handle for the benchmark device node.
///
/// The file descriptor is closed on drop.
#[derive(Debug)]
pub struct DeviceClient {
    fd: RawFd,
    path: String,
}

impl DeviceClient {
    /// Open the device node.
    ///
    /// Fails with [`TransportError::Open`] when the node is missing
    /// (module not loaded) or inaccessible.
    pub fn open(path: &str) -> Result<Self, TransportError> {
        let cpath = CString::new(path).map_err(|_| TransportError::Open {
            path: path.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"),
        })?;

        let fd = unsafe { libc::open(cpath.as_ptr(), libc::O_RDWR) };
        if fd < 0 {
            return Err(TransportError::Open {
                path: path.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        Ok(Self {
            fd,
            path: path.to_string(),
        })
    }

    /// Path the client was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request one privileged batch of `reps` repetitions of `op`.
    ///
    /// Blocks until the privileged side has completed the entire loop and
    /// reported its summary to the kernel log. A negative return from the
    /// device is surfaced as [`TransportError::Request`] naming the
    /// operation and OS error.
    pub fn run(&self, op: OpKind, reps: usize) -> Result<(), TransportError> {
        let ret = unsafe { libc::ioctl(self.fd, ioctl_for(op) as _, reps as libc::c_ulong) };
        if ret < 0 {
            return Err(TransportError::Request {
                op,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

impl Drop for DeviceClient {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_reports_open_error() {
        let err = DeviceClient::open("/dev/nonexistent-microbench").unwrap_err();
        match err {
            TransportError::Open { path, .. } => {
                assert_eq!(path, "/dev/nonexistent-microbench");
            }
            other => panic!("expected Open error, got {}", other),
        }
    }
}
