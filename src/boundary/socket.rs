//! Unix-socket transport emulating the privileged boundary.
//!
//! Where no benchmark kernel module is available, the privileged side can
//! run as a separate process (typically as root, pinned and with port
//! access) serving synchronous requests over a Unix socket. The contract
//! is the same as the device transport: one crossing per batch, the full
//! measurement loop on the privileged side, only the summary returned.
//!
//! Wire format: one JSON object per line in each direction.
//! Request `{"op": <raw opcode>, "reps": <count>}`, reply
//! `{"status": <0 or negative>, "error": ..., "summary": ...}`.

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};

use serde::{Deserialize, Serialize};

use crate::measurement::{Driver, OpKind};
use crate::output::format_detailed;
use crate::statistics::Summary;

use super::{dispatch, TransportError};

#[derive(Debug, Serialize, Deserialize)]
struct WireRequest {
    op: u32,
    reps: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireReply {
    status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

/// The privileged side of the socket boundary.
///
/// Owns one [`Driver`], so back-to-back batches of the same size class
/// reuse a single sample buffer.
#[derive(Debug, Default)]
pub struct SocketServer {
    driver: Driver,
}

impl SocketServer {
    /// Create a server with an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept and serve connections forever.
    pub fn serve(&mut self, listener: &UnixListener) -> io::Result<()> {
        for stream in listener.incoming() {
            self.serve_stream(stream?)?;
        }
        Ok(())
    }

    /// Serve one connection until the peer closes it.
    ///
    /// Each request is handled fully (decode, measure, summarize, log,
    /// reply) before the next is read; the caller observes a synchronous
    /// round trip per batch.
    pub fn serve_stream(&mut self, stream: UnixStream) -> io::Result<()> {
        let mut writer = stream.try_clone()?;
        let reader = BufReader::new(stream);

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let reply = self.handle_line(&line);
            serde_json::to_writer(&mut writer, &reply)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> WireReply {
        let request: WireRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                return WireReply {
                    status: -(libc::EINVAL),
                    error: Some(format!("malformed request: {}", err)),
                    summary: None,
                }
            }
        };

        match dispatch(&mut self.driver, request.op, request.reps as usize) {
            Ok(summary) => {
                // The privileged side reports its own results; the raw
                // buffer never leaves this process.
                let label = OpKind::from_raw(request.op)
                    .map(|op| op.name())
                    .unwrap_or("unknown");
                eprintln!("{}", format_detailed(label, &summary));
                WireReply {
                    status: 0,
                    error: None,
                    summary: Some(summary),
                }
            }
            Err(err) => WireReply {
                status: err.status(),
                error: Some(err.to_string()),
                summary: None,
            },
        }
    }
}

/// The unprivileged side of the socket boundary.
#[derive(Debug)]
pub struct SocketClient {
    stream: UnixStream,
}

impl SocketClient {
    /// Connect to a serving privileged process.
    pub fn connect(path: &str) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Open {
            path: path.to_string(),
            source,
        })?;
        Ok(Self { stream })
    }

    /// Wrap an already-connected stream (used by tests with
    /// `UnixStream::pair`).
    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Request one privileged batch and block for its summary.
    ///
    /// The summary is the privileged side's computation; no per-sample
    /// data crosses back.
    pub fn run(&mut self, op: OpKind, reps: usize) -> Result<Summary, TransportError> {
        let request = WireRequest {
            op: op.raw(),
            reps: reps as u64,
        };
        let mut line = serde_json::to_string(&request).map_err(|err| TransportError::Protocol {
            detail: format!("encoding request: {}", err),
        })?;
        line.push('\n');

        self.stream
            .write_all(line.as_bytes())
            .map_err(|source| TransportError::Request { op, source })?;

        let mut reply_line = String::new();
        let mut reader = BufReader::new(&self.stream);
        reader
            .read_line(&mut reply_line)
            .map_err(|source| TransportError::Request { op, source })?;
        if reply_line.is_empty() {
            return Err(TransportError::Protocol {
                detail: "privileged side closed the connection".to_string(),
            });
        }

        let reply: WireReply =
            serde_json::from_str(&reply_line).map_err(|err| TransportError::Protocol {
                detail: format!("decoding reply: {}", err),
            })?;

        if reply.status < 0 {
            return Err(TransportError::Rejected {
                op,
                status: reply.status,
                reason: reply.error,
            });
        }
        reply.summary.ok_or_else(|| TransportError::Protocol {
            detail: "success reply carried no summary".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_request_is_rejected_not_fatal() {
        let mut server = SocketServer::new();
        let reply = server.handle_line("{not json");
        assert!(reply.status < 0);
        assert!(reply.summary.is_none());
        assert!(reply.error.is_some());
    }

    #[test]
    fn unknown_opcode_reply_has_negative_status() {
        let mut server = SocketServer::new();
        let reply = server.handle_line("{\"op\": 77, \"reps\": 10}");
        assert_eq!(reply.status, -(libc::EINVAL));
        assert!(reply.summary.is_none());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn served_batch_returns_summary() {
        let mut server = SocketServer::new();
        let reply = server.handle_line("{\"op\": 2, \"reps\": 16}");
        assert_eq!(reply.status, 0);
        assert_eq!(reply.summary.unwrap().count, 16);
    }
}
