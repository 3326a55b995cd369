//! The discovered-device record and its classification.

use std::fmt;
use std::net::Ipv4Addr;

/// Coarse device category derived from OUI vendor or hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    Pc,
    PhoneTablet,
    Router,
    Printer,
    #[default]
    Unknown,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceKind::Pc => "PC",
            DeviceKind::PhoneTablet => "Phone/Tablet",
            DeviceKind::Router => "Router",
            DeviceKind::Printer => "Printer",
            DeviceKind::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// One device observed on the subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub ip: Ipv4Addr,
    /// Colon- or hyphen-separated MAC as the ARP source printed it.
    pub mac: String,
    /// Empty when neither DNS nor NetBIOS produced a name.
    pub hostname: String,
    pub kind: DeviceKind,
}

impl Device {
    pub fn new(ip: Ipv4Addr, mac: String) -> Self {
        Self {
            ip,
            mac,
            hostname: String::new(),
            kind: DeviceKind::Unknown,
        }
    }

    /// Hostname when known, otherwise the classification.
    pub fn display_name(&self) -> String {
        if self.hostname.is_empty() {
            self.kind.to_string()
        } else {
            format!("{}, {}", self.hostname, self.kind)
        }
    }
}

/// True for the all-zero placeholder MACs some ARP sources emit for
/// incomplete entries.
pub fn is_invalid_mac(mac: &str) -> bool {
    mac.is_empty() || mac == "00:00:00:00:00:00" || mac == "00-00-00-00-00-00"
}
