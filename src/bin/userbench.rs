//! User-space microbenchmark.
//!
//! Measures the trap-free path (`cpuid`) and the intercepted slow path
//! (`out 0xE9`, requires root for port access) directly in this process
//! and prints the detailed statistics for each. Pass an iteration count
//! as the first argument and `--dump` to also export the raw samples.

use std::process::exit;

use vmexit_bench::{measurement, output, Bench, OpKind};

fn main() {
    let mut iterations = 500_000usize;
    let mut dump = false;

    for arg in std::env::args().skip(1) {
        if arg == "--dump" {
            dump = true;
        } else {
            match arg.parse() {
                Ok(n) if n > 0 => iterations = n,
                _ => {
                    eprintln!("Usage: userbench [num_iterations] [--dump]");
                    exit(1);
                }
            }
        }
    }

    println!("=== User Space Microbenchmark ===");
    println!("Number of iterations: {}", iterations);
    println!(
        "Calibration: {:.2} cycles/ns\n",
        measurement::cycles_per_ns()
    );

    let mut bench = Bench::new().iterations(iterations);

    for (op, label) in [
        (OpKind::Cpuid, "CPUID (user, fast)"),
        (OpKind::PortWrite, "OUT 0xE9 (user, slow)"),
    ] {
        match bench.run_user(op) {
            Ok(summary) => {
                print!("{}", output::format_detailed(label, &summary));
                if dump {
                    if let Some(store) = bench.samples() {
                        print!("{}", output::format_samples(label, store, 10));
                    }
                }
            }
            Err(err) => {
                eprintln!("Error: {} failed: {}", label, err);
                exit(1);
            }
        }
    }
}
