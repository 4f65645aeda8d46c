//! Paired-timestamp protocol for bracketing a measured operation.
//!
//! The two ends of a timed window serialize differently on purpose:
//! - [`tsc_start`] issues a full serializing barrier before reading the
//!   counter, so no earlier instruction's side effects bleed into the
//!   window and nothing after the read is hoisted above it.
//! - [`tsc_end`] uses a partially serializing read (the measured
//!   instruction has retired before the counter is sampled) followed by a
//!   load fence, so later instructions cannot leak backward into the
//!   window. A second full barrier here would pollute the measured delta.
//!
//! On x86_64 this is `cpuid; rdtsc` / `rdtscp; lfence`. On aarch64 both
//! ends use `isb; mrs cntvct_el0`. Other targets fall back to a monotonic
//! `std::time::Instant` origin.
//!
//! The counter is per-core and not guaranteed synchronized across cores;
//! callers pin the measuring thread before a run (see [`crate::preflight`]).
//! These reads cannot fail.

use std::hint::black_box as std_black_box;
use std::sync::atomic::{compiler_fence, Ordering};
use std::time::Instant;

/// Wrapper around `std::hint::black_box` for preventing compiler
/// optimizations around measured values.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// Read the cycle counter with a full serializing barrier in front.
///
/// Marks the start of a timed window.
#[inline]
pub fn tsc_start() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        tsc_start_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        counter_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        counter_fallback()
    }
}

/// Read the cycle counter with a retire-fence behind it.
///
/// Marks the end of a timed window.
#[inline]
pub fn tsc_end() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        tsc_end_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        counter_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        counter_fallback()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn tsc_start_x86_64() -> u64 {
    compiler_fence(Ordering::SeqCst);

    let lo: u32;
    let hi: u32;
    unsafe {
        // cpuid fully serializes the pipeline before rdtsc samples the
        // counter. rbx is saved manually because LLVM reserves it.
        std::arch::asm!(
            "mov {tmp}, rbx",
            "cpuid",
            "rdtsc",
            "mov rbx, {tmp}",
            tmp = out(reg) _,
            inout("eax") 0u32 => lo,
            inout("ecx") 0u32 => _,
            out("edx") hi,
            options(nostack, nomem),
        );
    }

    compiler_fence(Ordering::SeqCst);

    ((hi as u64) << 32) | lo as u64
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn tsc_end_x86_64() -> u64 {
    compiler_fence(Ordering::SeqCst);

    let lo: u32;
    let hi: u32;
    unsafe {
        // rdtscp waits for prior instructions to retire before reading;
        // the trailing lfence stops later loads from starting early.
        std::arch::asm!(
            "rdtscp",
            "lfence",
            out("eax") lo,
            out("ecx") _,
            out("edx") hi,
            options(nostack, nomem),
        );
    }

    compiler_fence(Ordering::SeqCst);

    ((hi as u64) << 32) | lo as u64
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn counter_aarch64() -> u64 {
    compiler_fence(Ordering::SeqCst);

    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }

    compiler_fence(Ordering::SeqCst);

    cycles
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn counter_fallback() -> u64 {
    use std::sync::OnceLock;
    static START: OnceLock<Instant> = OnceLock::new();

    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// Calibrate the counter against wall-clock time.
///
/// Returns the estimated cycles per nanosecond (median of repeated
/// short sleeps). Used for report metadata only; raw cycles remain the
/// primary unit and calibration never runs inside a timed window.
pub fn cycles_per_ns() -> f64 {
    const CALIBRATION_MS: u64 = 1;
    const CALIBRATION_ITERATIONS: usize = 50;

    let mut ratios = Vec::with_capacity(CALIBRATION_ITERATIONS);

    for _ in 0..CALIBRATION_ITERATIONS {
        let start_cycles = tsc_start();
        let start_time = Instant::now();

        std::thread::sleep(std::time::Duration::from_millis(CALIBRATION_MS));

        let end_cycles = tsc_end();
        let elapsed_nanos = start_time.elapsed().as_nanos() as u64;

        if elapsed_nanos == 0 {
            continue;
        }

        let cycles = end_cycles.wrapping_sub(start_cycles);
        ratios.push(cycles as f64 / elapsed_nanos as f64);
    }

    if ratios.is_empty() {
        return 1.0;
    }

    ratios.sort_by(|a, b| a.total_cmp(b));
    let mid = ratios.len() / 2;
    if ratios.len() % 2 == 0 {
        (ratios[mid - 1] + ratios[mid]) / 2.0
    } else {
        ratios[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paired_reads_are_ordered() {
        let start = tsc_start();
        let end = tsc_end();
        // The end read retires after the start read; allow a tiny slack
        // for counters that tick coarsely.
        assert!(end >= start || start - end < 1000);
    }

    #[test]
    fn delta_reflects_work() {
        let start = tsc_start();
        let mut sum = 0u64;
        for i in 0..10_000 {
            sum = sum.wrapping_add(black_box(i));
        }
        black_box(sum);
        let end = tsc_end();
        assert!(end.wrapping_sub(start) > 0);
    }

    #[test]
    fn calibration_is_plausible() {
        let cpn = cycles_per_ns();
        // Anything from a 24 MHz ARM virtual timer to a 10 GHz TSC.
        assert!(cpn > 0.01 && cpn < 10.0, "cycles_per_ns = {}", cpn);
    }
}
