//! Hostname enrichment: reverse DNS with a NetBIOS fallback.
//!
//! A worker pool of ten resolves devices concurrently; each lookup gets a
//! one-second budget.  Timeouts are non-fatal – the device simply keeps an
//! empty hostname and later stages fall back to other signals.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::device::Device;

const POOL_SIZE: usize = 10;
const LOOKUP_BUDGET: Duration = Duration::from_secs(1);

/// Fills in hostnames where a resolver knows one.  Order is preserved.
pub async fn enrich_devices(devices: Vec<Device>) -> Vec<Device> {
    let pool = Arc::new(Semaphore::new(POOL_SIZE));
    let mut tasks = JoinSet::new();

    for (index, mut device) in devices.into_iter().enumerate() {
        let pool = Arc::clone(&pool);
        tasks.spawn(async move {
            // Closing the semaphore is not part of this flow, so acquire
            // cannot fail.
            let _permit = pool.acquire().await.expect("pool closed");
            device.hostname = resolve_hostname(device.ip.into()).await.unwrap_or_default();

            #[cfg(target_os = "windows")]
            if device.hostname.is_empty() && is_rfc1918(device.ip) {
                device.hostname = netbios_name(device.ip).await.unwrap_or_default();
            }

            (index, device)
        });
    }

    let mut enriched: Vec<(usize, Device)> = Vec::new();
    while let Some(result) = tasks.join_next().await {
        if let Ok(pair) = result {
            enriched.push(pair);
        }
    }
    enriched.sort_by_key(|(index, _)| *index);
    enriched.into_iter().map(|(_, d)| d).collect()
}

/// Reverse DNS with the per-lookup budget.  `None` on timeout or NXDOMAIN.
async fn resolve_hostname(ip: IpAddr) -> Option<String> {
    let lookup = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&ip));
    match tokio::time::timeout(LOOKUP_BUDGET, lookup).await {
        Ok(Ok(Ok(name))) => Some(name.trim_end_matches('.').to_string()),
        Ok(Ok(Err(e))) => {
            debug!("reverse DNS for {ip} failed: {e}");
            None
        }
        _ => {
            debug!("reverse DNS for {ip} timed out");
            None
        }
    }
}

/// RFC 1918 private ranges, the only ones worth a NetBIOS query.
#[cfg(target_os = "windows")]
fn is_rfc1918(ip: std::net::Ipv4Addr) -> bool {
    ip.is_private()
}

/// Queries the NetBIOS name service via `nbtstat -A`.
#[cfg(target_os = "windows")]
async fn netbios_name(ip: std::net::Ipv4Addr) -> Option<String> {
    let output = tokio::time::timeout(
        LOOKUP_BUDGET,
        tokio::process::Command::new("nbtstat")
            .args(["-A", &ip.to_string()])
            .output(),
    )
    .await
    .ok()?
    .ok()?;
    parse_nbtstat(&String::from_utf8_lossy(&output.stdout))
}

/// Extracts the machine name from `nbtstat -A` output: the first `UNIQUE`
/// `<00>` registration is the workstation name.
#[allow(dead_code)] // exercised by tests on every platform
fn parse_nbtstat(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.contains("<00>") && line.contains("UNIQUE"))
        .and_then(|line| line.split_whitespace().next())
        .map(|name| name.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
