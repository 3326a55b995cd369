//! Device classification from OUI vendor names and hostname heuristics.
//!
//! The IEEE publishes the registry mapping the first 24 bits of a MAC to
//! the assignee.  A successful download drives a vendor-keyword match;
//! when the registry is unreachable the classifier silently falls back to
//! hostname substrings, and a device matching neither stays `Unknown`.

use std::collections::HashMap;

use crate::device::{is_invalid_mac, Device, DeviceKind};
use crate::ScanError;

/// The IEEE OUI registry.  Plain HTTP; the payload is a public text file.
const IEEE_OUI_URL: &str = "http://standards-oui.ieee.org/oui.txt";

/// Parsed OUI → vendor-name table.
pub struct OuiTable {
    vendors: HashMap<String, String>,
}

impl OuiTable {
    /// Downloads and parses the registry.
    ///
    /// # Errors
    ///
    /// [`ScanError::OuiDownload`] on transport failure and
    /// [`ScanError::OuiStatus`] on a non-success response.  Callers degrade
    /// to hostname-only classification on either.
    pub async fn download() -> Result<Self, ScanError> {
        let response = reqwest::get(IEEE_OUI_URL).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::OuiStatus(status.as_u16()));
        }
        let text = response.text().await?;
        Ok(Self::parse(&text))
    }

    /// Parses registry text.  Relevant lines look like:
    ///
    /// ```text
    /// 00-04-F2   (hex)        Polycom
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut vendors = HashMap::new();
        for line in text.lines() {
            let Some((prefix, vendor)) = line.split_once("(hex)") else {
                continue;
            };
            let key = prefix.trim().replace('-', "").to_uppercase();
            let vendor = vendor.trim();
            if key.len() == 6 && !vendor.is_empty() {
                vendors.insert(key, vendor.to_string());
            }
        }
        Self { vendors }
    }

    /// Looks up the vendor for a MAC in any common separator format.
    pub fn vendor(&self, mac: &str) -> Option<&str> {
        let clean: String = mac
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .collect::<String>()
            .to_uppercase();
        if clean.len() < 6 {
            return None;
        }
        self.vendors.get(&clean[..6]).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

/// Classifies every device in place.
pub fn classify_devices(devices: &mut [Device], oui: Option<&OuiTable>) {
    for device in devices {
        device.kind = classify(device, oui);
    }
}

fn classify(device: &Device, oui: Option<&OuiTable>) -> DeviceKind {
    if is_invalid_mac(&device.mac) {
        return DeviceKind::Unknown;
    }

    if let Some(kind) = oui
        .and_then(|table| table.vendor(&device.mac))
        .and_then(kind_from_vendor)
    {
        return kind;
    }

    kind_from_hostname(&device.hostname)
}

fn kind_from_vendor(vendor: &str) -> Option<DeviceKind> {
    let v = vendor.to_lowercase();
    let contains_any = |names: &[&str]| names.iter().any(|n| v.contains(n));

    if contains_any(&["apple", "samsung", "xiaomi"]) {
        Some(DeviceKind::PhoneTablet)
    } else if contains_any(&["tp-link", "netgear", "cisco"]) {
        Some(DeviceKind::Router)
    } else if contains_any(&["hp", "canon", "epson"]) {
        Some(DeviceKind::Printer)
    } else {
        None
    }
}

fn kind_from_hostname(hostname: &str) -> DeviceKind {
    let h = hostname.to_lowercase().replace(['-', '_'], "");
    let contains_any = |names: &[&str]| names.iter().any(|n| h.contains(n));

    if contains_any(&["desktop", "laptop"]) {
        DeviceKind::Pc
    } else if contains_any(&["iphone", "ipad", "galaxy"]) {
        DeviceKind::PhoneTablet
    } else if contains_any(&["router", "gateway"]) {
        DeviceKind::Router
    } else if contains_any(&["printer"]) {
        DeviceKind::Printer
    } else {
        DeviceKind::Unknown
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
