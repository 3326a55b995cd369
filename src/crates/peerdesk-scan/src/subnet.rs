//! Local subnet inference from the machine's network interfaces.

use std::fmt;
use std::net::Ipv4Addr;

use if_addrs::IfAddr;

/// Interface name fragments that mark virtual adapters we must not scan.
const SKIP_NAME_FRAGMENTS: &[&str] = &["virtual", "vmware", "loopback", "tunnel"];

/// An IPv4 network in CIDR terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub prefix: u8,
}

impl Subnet {
    pub fn new(addr: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        let network = Ipv4Addr::from(u32::from(addr) & u32::from(netmask));
        Self {
            network,
            prefix: u32::from(netmask).count_ones() as u8,
        }
    }

    /// Number of host addresses (network and broadcast excluded).
    pub fn host_count(&self) -> u32 {
        match self.prefix {
            32 => 1,
            31 => 2,
            p => ((1u64 << (32 - p)) - 2) as u32,
        }
    }

    /// Iterates every host address in the subnet.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        let base = u64::from(u32::from(self.network));
        let (first, last) = match self.prefix {
            32 => (base, base),
            31 => (base, base + 1),
            p => {
                let size = 1u64 << (32 - p);
                (base + 1, base + size - 2)
            }
        };
        (first..=last).map(|n| Ipv4Addr::from(n as u32))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// The subnet we live on plus our own address, so callers can exclude it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalNet {
    pub subnet: Subnet,
    pub addr: Ipv4Addr,
}

/// Picks the first up, non-loopback, non-virtual interface with an IPv4
/// address and returns its network.  `None` when no interface qualifies.
pub fn local_net() -> Option<LocalNet> {
    let interfaces = if_addrs::get_if_addrs().ok()?;
    for iface in interfaces {
        if iface.is_loopback() || should_skip_name(&iface.name) {
            continue;
        }
        if let IfAddr::V4(v4) = iface.addr {
            return Some(LocalNet {
                subnet: Subnet::new(v4.ip, v4.netmask),
                addr: v4.ip,
            });
        }
    }
    None
}

fn should_skip_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    SKIP_NAME_FRAGMENTS.iter().any(|frag| lower.contains(frag))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subnet_applies_netmask_to_address() {
        let subnet = Subnet::new(
            Ipv4Addr::new(192, 168, 1, 42),
            Ipv4Addr::new(255, 255, 255, 0),
        );
        assert_eq!(subnet.network, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(subnet.prefix, 24);
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_slash_24_has_254_hosts() {
        let subnet = Subnet::new(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(255, 255, 255, 0),
        );
        assert_eq!(subnet.host_count(), 254);
        let hosts: Vec<_> = subnet.hosts().collect();
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(hosts.last(), Some(&Ipv4Addr::new(10, 0, 0, 254)));
    }

    #[test]
    fn test_degenerate_prefixes() {
        let host = Subnet::new(
            Ipv4Addr::new(10, 0, 0, 5),
            Ipv4Addr::new(255, 255, 255, 255),
        );
        assert_eq!(host.host_count(), 1);
        assert_eq!(host.hosts().collect::<Vec<_>>(), vec![Ipv4Addr::new(10, 0, 0, 5)]);

        let pair = Subnet::new(
            Ipv4Addr::new(10, 0, 0, 4),
            Ipv4Addr::new(255, 255, 255, 254),
        );
        assert_eq!(pair.host_count(), 2);
    }

    #[test]
    fn test_virtual_adapter_names_are_skipped() {
        assert!(should_skip_name("VMware Network Adapter VMnet8"));
        assert!(should_skip_name("VirtualBox Host-Only"));
        assert!(should_skip_name("Loopback Pseudo-Interface 1"));
        assert!(should_skip_name("tunnel0"));
        assert!(!should_skip_name("eth0"));
        assert!(!should_skip_name("wlan0"));
    }
}
