//! Environment preparation for low-jitter measurement.
//!
//! The core depends on preconditions it does not implement: the measuring
//! thread stays on one logical core (the cycle counter is per-core), the
//! sample buffer is resident before timing begins, and the port probe has
//! I/O permission. This module provides those knobs; nothing in the core
//! calls them implicitly.
//!
//! All three require Linux; pinning and locking typically require
//! elevated privileges or generous rlimits, and port access requires
//! root.

#[cfg(target_os = "linux")]
use std::io;

/// Pin the calling thread to one logical core.
///
/// Cycle counters are not guaranteed synchronized across cores, so a
/// measurement run must not migrate.
#[cfg(target_os = "linux")]
pub fn pin_to_core(core: usize) -> io::Result<()> {
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core, &mut set);
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Lock current and future pages into memory.
///
/// Keeps the sample buffer resident so no page fault lands inside a
/// timed window.
#[cfg(target_os = "linux")]
pub fn lock_memory() -> io::Result<()> {
    if unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Grant the process access to one I/O port.
///
/// Required before the `out 0xE9` probe can run in user space. Needs
/// root.
#[cfg(target_os = "linux")]
pub fn request_port_access(port: u16) -> io::Result<()> {
    if unsafe { libc::ioperm(port as libc::c_ulong, 1, 1) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
