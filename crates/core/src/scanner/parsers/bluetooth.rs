//! `hcitool lescan` and `bluetoothctl devices` listings.

use std::collections::HashSet;

use crate::identify::{classify_bluetooth_device, manufacturer_or_unknown};
use crate::scanner::types::BleDevice;

use super::normalize_mac;

/// Signal strength assumed for `hcitool lescan` results, which carry none.
pub const LESCAN_RSSI: i32 = -75;

/// Signal strength assumed for `bluetoothctl devices` results.
pub const BLUETOOTHCTL_RSSI: i32 = -65;

const UNKNOWN_PLACEHOLDER: &str = "(unknown)";

/// One device line from a listing tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BleSighting {
    pub mac_address: String,
    pub name: String,
    pub rssi: i32,
}

/// Parses `MAC NAME` lines. Entries named `(unknown)` or with no name are dropped.
pub fn parse_lescan(output: &str) -> Vec<BleSighting> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (mac, name) = line.split_once(char::is_whitespace)?;
            let mac = normalize_mac(mac)?;
            let name = name.trim();
            if name.is_empty() || name == UNKNOWN_PLACEHOLDER {
                return None;
            }
            Some(BleSighting {
                mac_address: mac,
                name: name.to_string(),
                rssi: LESCAN_RSSI,
            })
        })
        .collect()
}

/// Parses lines containing `Device MAC NAME`.
pub fn parse_bluetoothctl_devices(output: &str) -> Vec<BleSighting> {
    output
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("Device ")?;
            let rest = rest.trim();
            let (mac, name) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let mac = normalize_mac(mac)?;
            let name = name.trim();
            let name = if name.is_empty() || name == UNKNOWN_PLACEHOLDER {
                "Unknown Device"
            } else {
                name
            };
            Some(BleSighting {
                mac_address: mac,
                name: name.to_string(),
                rssi: BLUETOOTHCTL_RSSI,
            })
        })
        .collect()
}

/// Merges sightings from several sources into devices, first-seen wins per MAC.
pub fn merge_sightings<I>(sources: I) -> Vec<BleDevice>
where
    I: IntoIterator<Item = Vec<BleSighting>>,
{
    let mut seen = HashSet::new();
    let mut devices = Vec::new();
    for sighting in sources.into_iter().flatten() {
        if !seen.insert(sighting.mac_address.clone()) {
            continue;
        }
        devices.push(BleDevice {
            manufacturer: manufacturer_or_unknown(&sighting.mac_address).to_string(),
            device_type: classify_bluetooth_device(&sighting.name).to_string(),
            mac_address: sighting.mac_address,
            name: sighting.name,
            rssi: sighting.rssi,
        });
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESCAN: &str = "LE Scan ...\n\
        A4:83:E7:11:22:33 Jane's AirPods\n\
        A4:83:E7:11:22:33 (unknown)\n\
        7c:d9:f4:00:00:01 (unknown)\n\
        7c:d9:f4:00:00:01 JBL Flip 5\n\
        not a device line\n";

    const BLUETOOTHCTL: &str = "Device A4:83:E7:11:22:33 AirPods Pro\n\
        [CHG] Device 88:C6:26:AA:BB:CC Tile\n\
        Device 12:34:56:78:9A:BC\n";

    #[test]
    fn test_lescan_filters_placeholder() {
        let sightings = parse_lescan(LESCAN);
        let names: Vec<&str> = sightings.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Jane's AirPods", "JBL Flip 5"]);
        assert_eq!(sightings[1].mac_address, "7C:D9:F4:00:00:01");
        assert!(sightings.iter().all(|s| s.rssi == LESCAN_RSSI));
    }

    #[test]
    fn test_bluetoothctl_lines() {
        let sightings = parse_bluetoothctl_devices(BLUETOOTHCTL);
        assert_eq!(sightings.len(), 3);
        assert_eq!(sightings[1].name, "Tile");
        assert_eq!(sightings[2].name, "Unknown Device");
    }

    #[test]
    fn test_merge_first_seen_wins() {
        let devices = merge_sightings([parse_lescan(LESCAN), parse_bluetoothctl_devices(BLUETOOTHCTL)]);
        assert_eq!(devices.len(), 4);

        let airpods = &devices[0];
        assert_eq!(airpods.mac_address, "A4:83:E7:11:22:33");
        assert_eq!(airpods.name, "Jane's AirPods");
        assert_eq!(airpods.rssi, LESCAN_RSSI);
        assert_eq!(airpods.manufacturer, "Apple");
        assert_eq!(airpods.device_type, "Audio / Headphones");

        let tile = devices.iter().find(|d| d.name == "Tile").unwrap();
        assert_eq!(tile.manufacturer, "Tile");
        assert_eq!(tile.device_type, "Tracker");

        let unknown = devices.iter().find(|d| d.mac_address == "12:34:56:78:9A:BC").unwrap();
        assert_eq!(unknown.manufacturer, "Unknown");
    }
}
