//! Emulated privileged endpoint.
//!
//! Serves batched measurement requests over a Unix socket, standing in
//! for the benchmark kernel module where none is available. Run it with
//! elevated privileges on the core you want measured; each request is
//! executed entirely within this process and only the summary is
//! returned to the caller.

#[cfg(unix)]
fn main() {
    use std::os::unix::net::UnixListener;
    use std::process::exit;

    use vmexit_bench::boundary::SocketServer;

    let mut socket_path = "/tmp/vmexit-benchd.sock".to_string();
    let mut pin_core: Option<usize> = Some(0);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--socket" => match args.next() {
                Some(path) => socket_path = path,
                None => usage(),
            },
            "--core" => match args.next().and_then(|c| c.parse().ok()) {
                Some(core) => pin_core = Some(core),
                None => usage(),
            },
            "--no-pin" => pin_core = None,
            _ => usage(),
        }
    }

    #[cfg(target_os = "linux")]
    {
        use vmexit_bench::{measurement, preflight};

        if let Some(core) = pin_core {
            if let Err(err) = preflight::pin_to_core(core) {
                eprintln!("warning: could not pin to core {}: {}", core, err);
            }
        }
        if let Err(err) = preflight::lock_memory() {
            eprintln!("warning: could not lock memory: {}", err);
        }
        if let Err(err) = preflight::request_port_access(measurement::INTERCEPTED_PORT) {
            eprintln!(
                "warning: no I/O port access ({}); 'out 0xE9' requests will fault",
                err
            );
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = pin_core;

    // A stale socket file from a previous run would block the bind.
    let _ = std::fs::remove_file(&socket_path);
    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("Error: could not bind {}: {}", socket_path, err);
            exit(1);
        }
    };
    eprintln!("benchd: listening on {}", socket_path);

    let mut server = SocketServer::new();
    if let Err(err) = server.serve(&listener) {
        eprintln!("Error: serving failed: {}", err);
        exit(1);
    }
}

#[cfg(unix)]
fn usage() -> ! {
    eprintln!("Usage: benchd [--socket path] [--core n | --no-pin]");
    std::process::exit(1);
}

#[cfg(not(unix))]
fn main() {
    eprintln!("benchd requires a Unix platform");
    std::process::exit(1);
}
