//! Session-port probe: which filtered devices actually run a peer.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::debug;

use crate::device::Device;

const PROBE_BUDGET: Duration = Duration::from_secs(2);

/// Attempts a TCP connect to `port` on every device concurrently and
/// returns the ones that accept.
pub async fn probe_peers(devices: Vec<Device>, port: u16) -> Vec<Device> {
    let mut tasks = JoinSet::new();
    for device in devices {
        tasks.spawn(async move {
            let connect = TcpStream::connect((device.ip, port));
            match tokio::time::timeout(PROBE_BUDGET, connect).await {
                Ok(Ok(_stream)) => Some(device),
                Ok(Err(e)) => {
                    debug!("{}:{port} refused: {e}", device.ip);
                    None
                }
                Err(_) => {
                    debug!("{}:{port} timed out", device.ip);
                    None
                }
            }
        });
    }

    let mut peers = Vec::new();
    while let Some(result) = tasks.join_next().await {
        if let Ok(Some(device)) = result {
            peers.push(device);
        }
    }
    peers
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_finds_listening_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Keep accepting so the probe's connect succeeds.
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let devices = vec![Device::new(
            Ipv4Addr::LOCALHOST,
            "aa:bb:cc:dd:ee:01".to_string(),
        )];
        let peers = probe_peers(devices, port).await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].ip, Ipv4Addr::LOCALHOST);
    }

    #[tokio::test]
    async fn test_probe_drops_closed_port() {
        // Bind then immediately drop to find a port that refuses connects.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let devices = vec![Device::new(
            Ipv4Addr::LOCALHOST,
            "aa:bb:cc:dd:ee:02".to_string(),
        )];
        let peers = probe_peers(devices, port).await;
        assert!(peers.is_empty());
    }

    #[tokio::test]
    async fn test_probe_of_empty_list_is_empty() {
        assert!(probe_peers(Vec::new(), 8080).await.is_empty());
    }
}
