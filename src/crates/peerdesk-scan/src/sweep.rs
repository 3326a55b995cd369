//! ICMP sweep to populate the OS ARP cache before it is read.
//!
//! One `ping` subprocess per host, each capped at one second; the sweep
//! waits for all of them.  Replies are irrelevant – the side effect of the
//! kernel learning neighbour MACs is the point.  Progress is logged at a
//! coarse interval so a large subnet is observably alive.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::subnet::Subnet;

/// Per-host budget: the platform ping's own timeout plus scheduling slack.
const HOST_BUDGET: Duration = Duration::from_secs(1);

/// Pings every host of `subnet` once, concurrently, and waits for all.
pub async fn ping_sweep(subnet: &Subnet) {
    let total = subnet.host_count();
    let started = Instant::now();
    let completed = Arc::new(AtomicU32::new(0));
    info!("pinging {total} hosts on {subnet}");

    let mut tasks = JoinSet::new();
    for ip in subnet.hosts() {
        let completed = Arc::clone(&completed);
        tasks.spawn(async move {
            ping_host(ip).await;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 64 == 0 {
                debug!("sweep progress: {done}/{total}");
            }
        });
    }
    while tasks.join_next().await.is_some() {}

    info!(
        "sweep of {total} hosts finished in {:.1}s",
        started.elapsed().as_secs_f32()
    );
}

/// Sends a single echo request via the platform ping command.
async fn ping_host(ip: Ipv4Addr) {
    let mut cmd = platform_ping(ip);
    cmd.stdout(Stdio::null()).stderr(Stdio::null());

    // The command carries its own timeout flag, but a stuck process must not
    // stall the whole sweep, hence the outer budget.
    match tokio::time::timeout(HOST_BUDGET, cmd.status()).await {
        Ok(Err(e)) => debug!("failed to run ping for {ip}: {e}"),
        _ => {}
    }
}

#[cfg(target_os = "windows")]
fn platform_ping(ip: Ipv4Addr) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-n", "1", "-w", "300", &ip.to_string()]);
    cmd
}

#[cfg(not(target_os = "windows"))]
fn platform_ping(ip: Ipv4Addr) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-c", "1", "-W", "1", &ip.to_string()]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_of_single_host_subnet_terminates() {
        // A /32 on localhost completes within the per-host budget whether or
        // not a ping binary exists in the environment.
        let subnet = Subnet::new(
            Ipv4Addr::new(127, 0, 0, 1),
            Ipv4Addr::new(255, 255, 255, 255),
        );
        let started = Instant::now();
        ping_sweep(&subnet).await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
