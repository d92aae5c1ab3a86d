use crate::types::{ProbeResult, ProbeStatus};
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{self, error::Elapsed};

/// Attempt one TCP connection to `host:port` bounded by `timeout` and classify the outcome.
///
/// - Success → `open`; the stream is dropped immediately.
/// - Refused/reset/aborted → `closed`.
/// - Anything else (unreachable, resolution failure, timeout) → `error`, with the
///   host, port and underlying error text in the message.
///
/// No retries, and never fails: every failure path is encoded in the returned result.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> ProbeResult {
    let outcome = time::timeout(timeout, TcpStream::connect((host, port))).await;
    classify(host, port, outcome)
}

/// Turn a bounded connect outcome into a result. The connection, if any, is dropped here.
pub fn classify<S>(host: &str, port: u16, outcome: Result<io::Result<S>, Elapsed>) -> ProbeResult {
    match outcome {
        Ok(Ok(_stream)) => ProbeResult::open(port),
        Ok(Err(e)) => match status_for_error(&e) {
            ProbeStatus::Closed => ProbeResult::closed(port),
            _ => ProbeResult::error(host, port, e),
        },
        Err(_) => ProbeResult::error(host, port, "timed out"),
    }
}

/// Map a connect error to a port status. Active rejection by the peer means closed.
pub fn status_for_error(err: &io::Error) -> ProbeStatus {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => ProbeStatus::Closed,
        _ => ProbeStatus::Error,
    }
}
