//! Parsers for external tool output.
//!
//! Each tool's grammar lives in its own module. Line-oriented listings are
//! parsed leniently (unrecognised lines are skipped); formats where nothing
//! usable is an error return [`ParseError`].

mod bluetooth;
mod gps;
mod sweep;
mod wifi;

pub use bluetooth::{
    merge_sightings, parse_bluetoothctl_devices, parse_lescan, BleSighting, BLUETOOTHCTL_RSSI,
    LESCAN_RSSI,
};
pub use gps::parse_gpspipe;
pub use sweep::{parse_sweep, UNKNOWN_LABEL};
pub use wifi::{parse_iwlist, parse_nmcli, percent_to_dbm, HIDDEN_NETWORK, MISSING_SIGNAL_DBM};

use thiserror::Error;

/// Output that could not be turned into any result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Uppercased MAC if `text` is a colon-separated address other than all zeros.
pub(crate) fn normalize_mac(text: &str) -> Option<String> {
    let mac = text.trim().to_ascii_uppercase();
    let well_formed = mac.len() == 17
        && mac.split(':').count() == 6
        && mac
            .split(':')
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));
    (well_formed && mac != "00:00:00:00:00:00").then_some(mac)
}
