//! Dispatch-contract round trips over the socket boundary.

#![cfg(unix)]

use std::os::unix::net::UnixStream;
use std::thread;

use vmexit_bench::boundary::{SocketClient, SocketServer, TransportError};
use vmexit_bench::OpKind;

fn with_server<T>(f: impl FnOnce(&mut SocketClient) -> T) -> T {
    let (client_end, server_end) = UnixStream::pair().unwrap();
    let server = thread::spawn(move || {
        let mut server = SocketServer::new();
        server.serve_stream(server_end).unwrap();
    });

    let mut client = SocketClient::from_stream(client_end);
    let result = f(&mut client);

    drop(client);
    server.join().unwrap();
    result
}

#[cfg(target_arch = "x86_64")]
#[test]
fn served_batch_returns_summary_with_full_count() {
    let summary = with_server(|client| client.run(OpKind::Cpuid, 64).unwrap());
    assert_eq!(summary.count, 64);
    assert!(summary.min <= summary.max);
}

#[cfg(target_arch = "x86_64")]
#[test]
fn consecutive_batches_share_one_connection() {
    // One crossing per batch: each run() call is a single synchronous
    // request/response exchange.
    let (first, second) = with_server(|client| {
        let first = client.run(OpKind::Cpuid, 32).unwrap();
        let second = client.run(OpKind::Cpuid, 16).unwrap();
        (first, second)
    });
    assert_eq!(first.count, 32);
    assert_eq!(second.count, 16);
}

#[test]
fn zero_repetitions_are_rejected_by_the_privileged_side() {
    let err = with_server(|client| client.run(OpKind::Cpuid, 0).unwrap_err());
    match err {
        TransportError::Rejected { op, status, .. } => {
            assert_eq!(op, OpKind::Cpuid);
            assert!(status < 0);
        }
        other => panic!("expected rejection, got {}", other),
    }
}

#[test]
fn connecting_to_a_missing_socket_is_an_open_error() {
    let err = SocketClient::connect("/tmp/definitely-not-a-benchd.sock").unwrap_err();
    match err {
        TransportError::Open { path, .. } => {
            assert_eq!(path, "/tmp/definitely-not-a-benchd.sock");
        }
        other => panic!("expected Open error, got {}", other),
    }
}
