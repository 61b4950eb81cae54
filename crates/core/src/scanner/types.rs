//! Discovery and status types for the scan coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::audio::AudioSessionState;
use crate::capabilities::MediumAvailability;

/// Source medium of a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Ble,
    Wifi,
    Sdr,
    /// Only used for status and metrics; never carried by a discovery.
    Gps,
}

impl Medium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medium::Ble => "ble",
            Medium::Wifi => "wifi",
            Medium::Sdr => "sdr",
            Medium::Gps => "gps",
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Bluetooth (classic or LE) device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BleDevice {
    pub mac_address: String,
    pub name: String,
    pub rssi: i32,
    pub device_type: String,
    pub manufacturer: String,
}

/// A Wi-Fi access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiDevice {
    pub mac_address: String,
    pub ssid: String,
    pub rssi: i32,
    pub channel: u32,
    pub encryption: bool,
    pub frequency_khz: Option<u64>,
    pub manufacturer: String,
}

/// A spectrum bin above the noise threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdrSignal {
    pub frequency_hz: u64,
    pub power_dbfs: f64,
    pub bandwidth_hz: u64,
    pub label: String,
    pub band: String,
}

/// One normalized discovery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiscoveredSignal {
    Ble(BleDevice),
    Wifi(WifiDevice),
    Sdr(SdrSignal),
}

impl DiscoveredSignal {
    pub fn medium(&self) -> Medium {
        match self {
            DiscoveredSignal::Ble(_) => Medium::Ble,
            DiscoveredSignal::Wifi(_) => Medium::Wifi,
            DiscoveredSignal::Sdr(_) => Medium::Sdr,
        }
    }
}

/// A position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Ground speed in m/s.
    pub speed: Option<f64>,
    /// Course over ground in degrees.
    pub heading: Option<f64>,
    pub accuracy_meters: f64,
    pub timestamp_ms: i64,
}

/// A discovery with its medium and position, as returned by a manual scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub medium: Medium,
    pub signal: DiscoveredSignal,
    pub gps: Option<GpsFix>,
}

impl Discovery {
    pub fn new(signal: DiscoveredSignal, gps: Option<GpsFix>) -> Self {
        Self {
            medium: signal.medium(),
            signal,
            gps,
        }
    }
}

/// Receives each discovery as it is produced. Invoked once per record.
pub type DiscoveryCallback =
    Arc<dyn Fn(&DiscoveredSignal, Medium, Option<&GpsFix>) + Send + Sync>;

/// Which media are mid-probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanningFlags {
    pub ble: bool,
    pub wifi: bool,
    pub sdr: bool,
    pub gps: bool,
}

impl ScanningFlags {
    pub fn set(&mut self, medium: Medium, value: bool) {
        match medium {
            Medium::Ble => self.ble = value,
            Medium::Wifi => self.wifi = value,
            Medium::Sdr => self.sdr = value,
            Medium::Gps => self.gps = value,
        }
    }

    pub fn get(&self, medium: Medium) -> bool {
        match medium {
            Medium::Ble => self.ble,
            Medium::Wifi => self.wifi,
            Medium::Sdr => self.sdr,
            Medium::Gps => self.gps,
        }
    }

    pub fn any(&self) -> bool {
        self.ble || self.wifi || self.sdr || self.gps
    }
}

/// Status snapshot shared by the coordinator, audio controller and readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScannerStatus {
    pub running: bool,
    pub available: MediumAvailability,
    pub scanning: ScanningFlags,
    pub last_gps: Option<GpsFix>,
    pub discoveries_total: u64,
    pub cycles_completed: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub node_id: Option<String>,
    pub audio: AudioSessionState,
}

/// Handle to the shared status record.
pub type SharedStatus = Arc<RwLock<ScannerStatus>>;

/// Creates an empty shared status.
pub fn new_shared_status() -> SharedStatus {
    Arc::new(RwLock::new(ScannerStatus::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_serializes_with_kind_tag() {
        let signal = DiscoveredSignal::Sdr(SdrSignal {
            frequency_hz: 1_025_000,
            power_dbfs: -40.0,
            bandwidth_hz: 25_000,
            label: "AM Broadcast".into(),
            band: "MF".into(),
        });
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["kind"], "sdr");
        assert_eq!(json["frequency_hz"], 1_025_000);
        assert_eq!(signal.medium(), Medium::Sdr);
    }

    #[test]
    fn test_scanning_flags() {
        let mut flags = ScanningFlags::default();
        assert!(!flags.any());
        flags.set(Medium::Wifi, true);
        assert!(flags.get(Medium::Wifi));
        assert!(flags.any());
        flags.set(Medium::Wifi, false);
        assert!(!flags.any());
    }
}
