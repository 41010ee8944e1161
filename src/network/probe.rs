//! TCP connect probe for a single port

use super::ProbeOutcome;
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// One connection attempt against one port.
///
/// Implementations must be cheap to share between tasks and must not keep any
/// socket open once `probe` returns.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn probe(&self, target: IpAddr, port: u16) -> ProbeOutcome;
}

/// Full-handshake connect probe with a fixed timeout.
///
/// Nothing is written to or read from the socket. A successful stream is
/// dropped before `probe` returns, so no connection outlives the call.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnectProbe {
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

}

#[async_trait]
impl ConnectionProbe for TcpConnectProbe {
    /// Perform a TCP connect scan on a single port
    async fn probe(&self, target: IpAddr, port: u16) -> ProbeOutcome {
        let addr = SocketAddr::new(target, port);

        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ProbeOutcome::Open {
                    port,
                    service: None,
                }
            }
            Ok(Err(e)) => classify_connect_error(port, &e),
            Err(_) => ProbeOutcome::Closed { port },
        }
    }
}

/// Map a failed connect to an outcome.
///
/// Anything the remote side or the network can cause counts as closed.
/// Local resource exhaustion and socket permission failures are surfaced,
/// since treating them as closed would silently hide open ports.
pub fn classify_connect_error(port: u16, error: &io::Error) -> ProbeOutcome {
    if is_unexpected(error) {
        ProbeOutcome::Errored {
            port,
            cause: error.to_string(),
        }
    } else {
        ProbeOutcome::Closed { port }
    }
}

fn is_unexpected(error: &io::Error) -> bool {
    if let Some(code) = error.raw_os_error() {
        if matches!(
            code,
            libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM | libc::EADDRNOTAVAIL
        ) {
            return true;
        }
    }

    // AddrNotAvailable on connect means the local ephemeral ports ran out.
    matches!(
        error.kind(),
        io::ErrorKind::OutOfMemory
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::AddrNotAvailable
    )
}
