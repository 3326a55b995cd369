//! # peerdesk-scan
//!
//! LAN peer discovery.  Given the session port, produce the list of peers on
//! the local IPv4 subnet that accept a peerdesk connection, enriched with
//! hostname and a coarse device classification.
//!
//! The pipeline runs concurrently with a bounded time budget per stage and
//! degrades instead of aborting: a failed OUI download demotes
//! classification to hostname heuristics, a DNS timeout leaves a hostname
//! empty, an unreadable ARP table yields an empty device list.  Only a
//! missing usable interface is a hard error – there is no subnet to scan.
//!
//! Stages, in order:
//!
//! 1. Infer the local subnet from the first usable interface
//!    ([`subnet::local_net`]).
//! 2. Ping every host once to populate the OS ARP cache
//!    ([`sweep::ping_sweep`]).
//! 3. Read the ARP table ([`arp::read_arp_table`]).
//! 4. Resolve hostnames with a small worker pool
//!    ([`enrich::enrich_devices`]).
//! 5. Deduplicate by MAC, preferring named and reachable entries
//!    ([`filter::dedup_devices`]).
//! 6. Classify by OUI vendor, falling back to hostname heuristics
//!    ([`classify`]).
//! 7. Probe the session port on each survivor ([`probe::probe_peers`]).

pub mod arp;
pub mod classify;
pub mod device;
pub mod enrich;
pub mod filter;
pub mod probe;
pub mod subnet;
pub mod sweep;

use tokio::sync::OnceCell;
use tracing::{info, warn};

pub use classify::OuiTable;
pub use device::{Device, DeviceKind};
pub use subnet::{LocalNet, Subnet};

/// Errors surfaced by discovery.  Everything else degrades.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// No up, non-virtual interface carries an IPv4 address.
    #[error("no usable network interface found")]
    NoInterface,

    /// The OUI registry download failed at the transport level.
    #[error("OUI table download failed: {0}")]
    OuiDownload(#[from] reqwest::Error),

    /// The OUI registry answered with a non-success status.
    #[error("OUI registry returned HTTP {0}")]
    OuiStatus(u16),
}

/// Discovery facade.  One instance per application; the OUI table download
/// happens at most once and is reused across rescans.
pub struct Scanner {
    port: u16,
    oui: OnceCell<Option<OuiTable>>,
}

impl Scanner {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            oui: OnceCell::new(),
        }
    }

    /// Runs the full pipeline and returns the peers that accept a session
    /// connection, sorted by address.
    ///
    /// # Errors
    ///
    /// Only [`ScanError::NoInterface`]; every other failure degrades into
    /// partial data.
    pub async fn find_reachable_peers(&self) -> Result<Vec<Device>, ScanError> {
        let net = subnet::local_net().ok_or(ScanError::NoInterface)?;
        info!("scanning subnet {} (local address {})", net.subnet, net.addr);

        sweep::ping_sweep(&net.subnet).await;

        let mut devices: Vec<Device> = arp::read_arp_table()
            .await
            .into_iter()
            .map(|entry| Device::new(entry.ip, entry.mac))
            .collect();
        info!("ARP table yielded {} devices", devices.len());

        devices = enrich::enrich_devices(devices).await;
        devices = filter::dedup_devices(devices).await;

        let oui = self.oui_table().await;
        classify::classify_devices(&mut devices, oui);
        info!("{} devices after filtering, probing session port", devices.len());

        let candidates: Vec<Device> = devices
            .into_iter()
            .filter(|d| d.ip != net.addr)
            .collect();
        let mut peers = probe::probe_peers(candidates, self.port).await;
        peers.sort_by_key(|d| d.ip);

        for peer in &peers {
            info!("reachable peer: {} ({})", peer.ip, peer.display_name());
        }
        Ok(peers)
    }

    /// The cached OUI table, downloading it on first use.  `None` when the
    /// registry is unreachable; classification then relies on hostnames.
    async fn oui_table(&self) -> Option<&OuiTable> {
        self.oui
            .get_or_init(|| async {
                match OuiTable::download().await {
                    Ok(table) => {
                        info!("OUI vendor table loaded ({} prefixes)", table.len());
                        Some(table)
                    }
                    Err(e) => {
                        warn!("OUI table unavailable, using hostname heuristics: {e}");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}
