//! Privileged-batch microbenchmark client.
//!
//! Hands one batched run per operation to the privileged side. With
//! `--device` (the default transport) the benchmark kernel module
//! performs the loops and reports to the kernel log; with `--socket` an
//! emulated privileged endpoint (see `benchd`) performs them and the
//! summaries are printed here.

#[cfg(unix)]
fn main() {
    use std::process::exit;

    use vmexit_bench::boundary::{SocketClient, DEFAULT_DEVICE};
    use vmexit_bench::{output, OpKind};

    let mut iterations = 200_000usize;
    let mut device = DEFAULT_DEVICE.to_string();
    let mut socket: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--device" => match args.next() {
                Some(path) => device = path,
                None => usage(),
            },
            "--socket" => match args.next() {
                Some(path) => socket = Some(path),
                None => usage(),
            },
            _ => match arg.parse() {
                Ok(n) if n > 0 => iterations = n,
                _ => usage(),
            },
        }
    }

    println!("=== Kernel Space Microbenchmark ===");
    println!("Number of iterations: {}\n", iterations);

    let tests = [
        (OpKind::Cpuid, "Test 1: CPUID instruction (fast path)"),
        (OpKind::Vmcall, "Test 2: VMCALL instruction"),
        (
            OpKind::PortWrite,
            "Test 3: OUT instruction to port 0xE9 (slow path)",
        ),
    ];

    if let Some(path) = socket {
        let mut client = match SocketClient::connect(&path) {
            Ok(client) => client,
            Err(err) => {
                eprintln!("Error: {}", err);
                eprintln!("Make sure benchd is running on {}.", path);
                exit(1);
            }
        };
        for (op, title) in tests {
            println!("Running {}...", title);
            match client.run(op, iterations) {
                Ok(summary) => {
                    println!("  \u{2713} Completed");
                    print!("{}", output::format_detailed(op.name(), &summary));
                }
                Err(err) => {
                    eprintln!("Error: {}", err);
                    exit(1);
                }
            }
        }
        return;
    }

    #[cfg(target_os = "linux")]
    {
        use vmexit_bench::boundary::DeviceClient;

        let client = match DeviceClient::open(&device) {
            Ok(client) => client,
            Err(err) => {
                eprintln!("Error: {}", err);
                eprintln!("Make sure the benchmark kernel module is loaded.");
                exit(1);
            }
        };
        for (op, title) in tests {
            println!("Running {}...", title);
            match client.run(op, iterations) {
                Ok(()) => println!("  \u{2713} Completed (see kernel log for statistics)\n"),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    exit(1);
                }
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = device;
        eprintln!("The device transport requires Linux; use --socket instead.");
        exit(1);
    }
}

#[cfg(unix)]
fn usage() -> ! {
    eprintln!("Usage: kernelbench [num_iterations] [--device path | --socket path]");
    std::process::exit(1);
}

#[cfg(not(unix))]
fn main() {
    eprintln!("kernelbench requires a Unix platform");
    std::process::exit(1);
}
