//! Pre-flight liveness heuristic

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// One connect attempt to `port`; any failure or timeout means unreachable.
///
/// Hosts that drop everything on this port look dead even when other ports
/// are open, which is why callers can skip the check.
pub async fn check_reachable(ip: IpAddr, port: u16, timeout: Duration) -> bool {
    let addr = SocketAddr::new(ip, port);

    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            log::debug!("Reachability probe to {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            log::debug!("Reachability probe to {} timed out after {:?}", addr, timeout);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_listening_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(check_reachable(localhost, port, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(!check_reachable(localhost, port, Duration::from_secs(1)).await);
    }
}
