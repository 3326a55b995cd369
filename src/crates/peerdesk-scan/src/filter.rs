//! MAC-based deduplication with a reachability tiebreak.
//!
//! The ARP table can hold several IPs for one MAC (DHCP churn, dual-stack
//! adapters).  One device per MAC survives, chosen by an ordered predicate:
//! a named entry beats an anonymous one, a reachable entry beats an
//! unreachable one, and the lexicographically smallest address breaks the
//! remaining ties deterministically.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinSet;

use crate::device::{is_invalid_mac, Device};

/// Reachability probe target and budget.  Port 80 answers on most devices
/// that are awake at all; the probe only has to distinguish live from stale
/// ARP entries.
const REACHABILITY_PORT: u16 = 80;
const REACHABILITY_BUDGET: Duration = Duration::from_millis(500);

/// Collapses `devices` to one entry per MAC.
pub async fn dedup_devices(devices: Vec<Device>) -> Vec<Device> {
    let mut groups: HashMap<String, Vec<Device>> = HashMap::new();
    for device in devices {
        if is_invalid_mac(&device.mac) {
            continue;
        }
        groups.entry(device.mac.clone()).or_default().push(device);
    }

    let unique_ips: HashSet<Ipv4Addr> = groups
        .values()
        .flat_map(|group| group.iter().map(|d| d.ip))
        .collect();
    let reachable = probe_reachability(unique_ips).await;

    let mut result: Vec<Device> = groups
        .into_values()
        .filter_map(|mut group| {
            group.sort_by(|a, b| compare_devices(a, b, &reachable));
            group.into_iter().next()
        })
        .collect();
    result.sort_by_key(|d| d.ip);
    result
}

/// Ordered predicate: hostname, then reachability, then smallest IP.
fn compare_devices(
    a: &Device,
    b: &Device,
    reachable: &HashMap<Ipv4Addr, bool>,
) -> Ordering {
    let named = |d: &Device| !d.hostname.is_empty();
    match named(b).cmp(&named(a)) {
        Ordering::Equal => {}
        other => return other,
    }

    let live = |d: &Device| reachable.get(&d.ip).copied().unwrap_or(false);
    match live(b).cmp(&live(a)) {
        Ordering::Equal => {}
        other => return other,
    }

    a.ip.cmp(&b.ip)
}

/// Probes each IP concurrently; a TCP connect within the budget counts as
/// reachable.
async fn probe_reachability(ips: HashSet<Ipv4Addr>) -> HashMap<Ipv4Addr, bool> {
    let mut tasks = JoinSet::new();
    for ip in ips {
        tasks.spawn(async move {
            let connect = TcpStream::connect((ip, REACHABILITY_PORT));
            let up = matches!(
                tokio::time::timeout(REACHABILITY_BUDGET, connect).await,
                Ok(Ok(_))
            );
            (ip, up)
        });
    }

    let mut reachable = HashMap::new();
    while let Some(result) = tasks.join_next().await {
        if let Ok((ip, up)) = result {
            reachable.insert(ip, up);
        }
    }
    reachable
}

// ── Tests ─────────────────────────────────────────────────────────────────────
