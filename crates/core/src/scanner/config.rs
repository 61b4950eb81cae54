//! Configuration for the scan coordinator.

use serde::{Deserialize, Serialize};

/// A frequency range swept by `rtl_power` each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepBand {
    /// Band name, used as the `band` of unidentified signals.
    pub name: String,
    pub start_hz: u64,
    pub end_hz: u64,
}

impl SweepBand {
    pub fn new(name: impl Into<String>, start_hz: u64, end_hz: u64) -> Self {
        Self {
            name: name.into(),
            start_hz,
            end_hz,
        }
    }
}

/// Fixed position used until GPS produces a fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default = "default_static_accuracy")]
    pub accuracy_meters: f64,
}

fn default_static_accuracy() -> f64 {
    100.0
}

/// Scan coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// How long `hcitool lescan` listens before it is stopped.
    #[serde(default = "default_ble_scan_secs")]
    pub ble_scan_secs: u64,

    /// Timeout for `bluetoothctl devices`.
    #[serde(default = "default_bluetoothctl_timeout")]
    pub bluetoothctl_timeout_secs: u64,

    /// Interface passed to `iwlist`.
    #[serde(default = "default_wifi_interface")]
    pub wifi_interface: String,

    /// Timeout for one Wi-Fi scan.
    #[serde(default = "default_wifi_timeout")]
    pub wifi_timeout_secs: u64,

    /// Bands swept each cycle, in order.
    #[serde(default = "default_sdr_bands")]
    pub sdr_bands: Vec<SweepBand>,

    /// `rtl_power` bin width.
    #[serde(default = "default_bin_width")]
    pub sdr_bin_width_hz: u64,

    /// `rtl_power` integration interval.
    #[serde(default = "default_integration")]
    pub sdr_integration_secs: u64,

    /// Timeout for one band sweep.
    #[serde(default = "default_sdr_timeout")]
    pub sdr_timeout_secs: u64,

    /// Bins above this power are reported.
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold_dbfs: f64,

    /// Timeout for `gpspipe`.
    #[serde(default = "default_gps_timeout")]
    pub gps_timeout_secs: u64,

    /// Accuracy reported when gpsd gives no error estimate.
    #[serde(default = "default_gps_accuracy")]
    pub default_gps_accuracy_meters: f64,

    #[serde(default)]
    pub static_position: Option<StaticPosition>,
}

fn default_ble_scan_secs() -> u64 {
    8
}

fn default_bluetoothctl_timeout() -> u64 {
    10
}

fn default_wifi_interface() -> String {
    "wlan0".to_string()
}

fn default_wifi_timeout() -> u64 {
    20
}

fn default_sdr_bands() -> Vec<SweepBand> {
    vec![
        SweepBand::new("FM Broadcast", 87_500_000, 108_000_000),
        SweepBand::new("Airband", 118_000_000, 137_000_000),
        SweepBand::new("Marine VHF", 156_000_000, 162_025_000),
        SweepBand::new("ISM 433", 433_050_000, 434_790_000),
    ]
}

fn default_bin_width() -> u64 {
    25_000
}

fn default_integration() -> u64 {
    1
}

fn default_sdr_timeout() -> u64 {
    30
}

fn default_noise_threshold() -> f64 {
    -45.0
}

fn default_gps_timeout() -> u64 {
    5
}

fn default_gps_accuracy() -> f64 {
    10.0
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ble_scan_secs: default_ble_scan_secs(),
            bluetoothctl_timeout_secs: default_bluetoothctl_timeout(),
            wifi_interface: default_wifi_interface(),
            wifi_timeout_secs: default_wifi_timeout(),
            sdr_bands: default_sdr_bands(),
            sdr_bin_width_hz: default_bin_width(),
            sdr_integration_secs: default_integration(),
            sdr_timeout_secs: default_sdr_timeout(),
            noise_threshold_dbfs: default_noise_threshold(),
            gps_timeout_secs: default_gps_timeout(),
            default_gps_accuracy_meters: default_gps_accuracy(),
            static_position: None,
        }
    }
}
