//! Frequency → service identification.

use serde::{Deserialize, Serialize};

/// A recognised service for a frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyId {
    pub label: String,
    pub band: String,
}

struct RangeEntry {
    start_mhz: f64,
    end_mhz: f64,
    label: &'static str,
    band: &'static str,
}

struct ExactEntry {
    mhz: f64,
    label: &'static str,
    band: &'static str,
}

/// Matching tolerance for exact-frequency entries.
pub const EXACT_TOLERANCE_MHZ: f64 = 0.5;

#[rustfmt::skip]
const EXACT: &[ExactEntry] = &[
    ExactEntry { mhz: 1575.42, label: "GPS L1", band: "L-Band" },
    ExactEntry { mhz: 1227.60, label: "GPS L2", band: "L-Band" },
    ExactEntry { mhz: 1176.45, label: "GPS L5", band: "L-Band" },
    ExactEntry { mhz: 1602.00, label: "GLONASS L1", band: "L-Band" },
];

// First match wins, so narrow allocations come before the wider bands they sit in.
#[rustfmt::skip]
const RANGES: &[RangeEntry] = &[
    RangeEntry { start_mhz: 0.5, end_mhz: 1.7, label: "AM Broadcast", band: "MF" },
    RangeEntry { start_mhz: 26.965, end_mhz: 27.405, label: "CB Radio", band: "HF" },
    RangeEntry { start_mhz: 87.5, end_mhz: 108.0, label: "FM Broadcast", band: "VHF" },
    RangeEntry { start_mhz: 108.0, end_mhz: 117.975, label: "Aviation Navigation (VOR/ILS)", band: "VHF" },
    RangeEntry { start_mhz: 118.0, end_mhz: 137.0, label: "Aviation Voice (Airband)", band: "VHF" },
    RangeEntry { start_mhz: 137.0, end_mhz: 138.0, label: "NOAA Weather Satellites (APT)", band: "VHF" },
    RangeEntry { start_mhz: 144.0, end_mhz: 148.0, label: "2m Amateur Radio", band: "VHF" },
    RangeEntry { start_mhz: 156.0, end_mhz: 162.025, label: "Marine VHF", band: "VHF" },
    RangeEntry { start_mhz: 162.4, end_mhz: 162.55, label: "NOAA Weather Radio", band: "VHF" },
    RangeEntry { start_mhz: 225.0, end_mhz: 400.0, label: "Military Aviation (UHF)", band: "UHF" },
    RangeEntry { start_mhz: 433.05, end_mhz: 434.79, label: "ISM 433 (Remotes/Sensors)", band: "UHF" },
    RangeEntry { start_mhz: 446.0, end_mhz: 446.2, label: "PMR446", band: "UHF" },
    RangeEntry { start_mhz: 420.0, end_mhz: 450.0, label: "70cm Amateur Radio", band: "UHF" },
    RangeEntry { start_mhz: 462.55, end_mhz: 467.725, label: "FRS/GMRS", band: "UHF" },
    RangeEntry { start_mhz: 698.0, end_mhz: 806.0, label: "LTE 700", band: "UHF" },
    RangeEntry { start_mhz: 824.0, end_mhz: 894.0, label: "Cellular 850", band: "UHF" },
    RangeEntry { start_mhz: 863.0, end_mhz: 870.0, label: "ISM 868 (LoRa/IoT)", band: "UHF" },
    RangeEntry { start_mhz: 902.0, end_mhz: 928.0, label: "ISM 915 (LoRa/IoT)", band: "UHF" },
    RangeEntry { start_mhz: 1030.0, end_mhz: 1090.0, label: "ADS-B/Mode-S", band: "L-Band" },
    RangeEntry { start_mhz: 1850.0, end_mhz: 1990.0, label: "PCS 1900", band: "L-Band" },
    RangeEntry { start_mhz: 2400.0, end_mhz: 2483.5, label: "2.4 GHz ISM (Wi-Fi/Bluetooth)", band: "S-Band" },
    RangeEntry { start_mhz: 5150.0, end_mhz: 5850.0, label: "5 GHz Wi-Fi", band: "C-Band" },
];

/// Identifies the service using `mhz`, if it is a known allocation.
pub fn identify_frequency(mhz: f64) -> Option<FrequencyId> {
    if !mhz.is_finite() {
        return None;
    }

    if let Some(e) = EXACT
        .iter()
        .find(|e| (mhz - e.mhz).abs() <= EXACT_TOLERANCE_MHZ)
    {
        return Some(FrequencyId {
            label: e.label.to_string(),
            band: e.band.to_string(),
        });
    }

    RANGES
        .iter()
        .find(|r| mhz >= r.start_mhz && mhz <= r.end_mhz)
        .map(|r| FrequencyId {
            label: r.label.to_string(),
            band: r.band.to_string(),
        })
}
