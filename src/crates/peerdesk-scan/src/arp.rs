//! ARP table access.
//!
//! Linux exposes the neighbour cache as `/proc/net/arp`; Windows prints it
//! via `arp -a`.  Both parsers are pure functions over the raw text so they
//! are testable on any platform.  Entries with the all-zero placeholder MAC
//! (incomplete neighbour solicitations) are discarded at the source.

use std::net::Ipv4Addr;

use tracing::warn;

use crate::device::is_invalid_mac;

/// One ARP neighbour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: String,
}

/// Reads the platform ARP source.  An unreadable table degrades to an
/// empty list – discovery continues with whatever the sweep found.
pub async fn read_arp_table() -> Vec<ArpEntry> {
    #[cfg(target_os = "windows")]
    {
        match windows_arp_output().await {
            Ok(text) => parse_arp_a(&text),
            Err(e) => {
                warn!("could not run `arp -a`: {e}");
                Vec::new()
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        match tokio::fs::read_to_string("/proc/net/arp").await {
            Ok(text) => parse_proc_net_arp(&text),
            Err(e) => {
                warn!("could not read /proc/net/arp: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(target_os = "windows")]
async fn windows_arp_output() -> std::io::Result<String> {
    let output = tokio::process::Command::new("arp")
        .arg("-a")
        .output()
        .await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parses `/proc/net/arp`.
///
/// ```text
/// IP address       HW type     Flags       HW address            Mask     Device
/// 192.168.1.1      0x1         0x2         a4:83:e7:aa:bb:cc     *        wlan0
/// ```
pub fn parse_proc_net_arp(text: &str) -> Vec<ArpEntry> {
    text.lines()
        .skip(1) // header row
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let ip: Ipv4Addr = fields[0].parse().ok()?;
            let mac = fields[3].to_string();
            if is_invalid_mac(&mac) {
                return None;
            }
            Some(ArpEntry { ip, mac })
        })
        .collect()
}

/// Parses `arp -a` output.
///
/// ```text
/// Interface: 192.168.1.10 --- 0xb
///   Internet Address      Physical Address      Type
///   192.168.1.1           a4-83-e7-aa-bb-cc     dynamic
/// ```
pub fn parse_arp_a(text: &str) -> Vec<ArpEntry> {
    text.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return None;
            }
            let ip: Ipv4Addr = fields[0].parse().ok()?;
            let mac = fields[1].to_string();
            if is_invalid_mac(&mac) || !looks_like_mac(&mac) {
                return None;
            }
            Some(ArpEntry { ip, mac })
        })
        .collect()
}

fn looks_like_mac(s: &str) -> bool {
    let sep_count = s.chars().filter(|c| *c == ':' || *c == '-').count();
    sep_count == 5 && s.len() == 17
}

// ── Tests ─────────────────────────────────────────────────────────────────────
