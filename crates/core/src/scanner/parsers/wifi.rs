//! `iwlist scan` and `nmcli -t dev wifi list` output.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::identify::{manufacturer_or_unknown, wifi_channel_to_mhz, wifi_mhz_to_channel};
use crate::scanner::types::WifiDevice;

use super::normalize_mac;

/// SSID reported for networks that do not broadcast one.
pub const HIDDEN_NETWORK: &str = "Hidden Network";

/// Signal strength reported when the tool gives none.
pub const MISSING_SIGNAL_DBM: i32 = -80;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Address:\s*([0-9A-Fa-f:]{17})").expect("valid regex"));
static ESSID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"ESSID:"([^"]*)""#).expect("valid regex"));
static SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Signal level[=:]\s*(-?\d+(?:\.\d+)?)(?:\s*/\s*(\d+))?").expect("valid regex")
});
static CHANNEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Channel[:\s]\s*(\d+)").expect("valid regex"));
static ENCRYPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Encryption key:\s*(on|off)").expect("valid regex"));
static FREQUENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Frequency[:=]\s*(\d+(?:\.\d+)?)\s*GHz").expect("valid regex"));

/// Converts a 0–100 signal quality percentage to dBm.
pub fn percent_to_dbm(percent: f64) -> i32 {
    (percent.clamp(0.0, 100.0) / 2.0 - 100.0) as i32
}

/// Parses `iwlist <iface> scan` output, one network per `Cell ` block.
///
/// Blocks without an `Address:` line are skipped.
pub fn parse_iwlist(output: &str) -> Vec<WifiDevice> {
    output.split("Cell ").filter_map(parse_cell).collect()
}

fn parse_cell(block: &str) -> Option<WifiDevice> {
    let mac = ADDRESS_RE
        .captures(block)
        .and_then(|c| normalize_mac(&c[1]))?;

    let ssid = ESSID_RE
        .captures(block)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| HIDDEN_NETWORK.to_string());

    let rssi = SIGNAL_RE
        .captures(block)
        .and_then(|c| {
            let value: f64 = c[1].parse().ok()?;
            match c.get(2).and_then(|m| m.as_str().parse::<f64>().ok()) {
                Some(scale) if scale > 0.0 => Some(percent_to_dbm(value * 100.0 / scale)),
                _ => Some(value.round() as i32),
            }
        })
        .unwrap_or(MISSING_SIGNAL_DBM);

    let frequency_khz = FREQUENCY_RE
        .captures(block)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|ghz| (ghz * 1_000_000.0).round() as u64);

    let channel = CHANNEL_RE
        .captures(block)
        .and_then(|c| c[1].parse::<u32>().ok());

    let encryption = ENCRYPTION_RE
        .captures(block)
        .map(|c| &c[1] == "on")
        .unwrap_or(false);

    Some(finish_device(mac, ssid, rssi, channel, frequency_khz, encryption))
}

/// Parses `nmcli -t -f BSSID,SSID,SIGNAL,CHAN,SECURITY,FREQ dev wifi list`.
///
/// Fields are colon-separated with literal colons escaped as `\:`.
pub fn parse_nmcli(output: &str) -> Vec<WifiDevice> {
    output
        .lines()
        .filter_map(|line| {
            let fields = split_terse(line);
            if fields.len() < 6 {
                return None;
            }
            let mac = normalize_mac(&fields[0])?;
            let ssid = Some(fields[1].trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(HIDDEN_NETWORK)
                .to_string();
            let rssi = fields[2]
                .trim()
                .parse::<f64>()
                .map(percent_to_dbm)
                .unwrap_or(MISSING_SIGNAL_DBM);
            let channel = fields[3].trim().parse::<u32>().ok();
            let security = fields[4].trim();
            let encryption = !security.is_empty() && security != "--";
            let frequency_khz = fields[5]
                .trim()
                .trim_end_matches("MHz")
                .trim()
                .parse::<u64>()
                .ok()
                .map(|mhz| mhz * 1000);
            Some(finish_device(mac, ssid, rssi, channel, frequency_khz, encryption))
        })
        .collect()
}

fn finish_device(
    mac: String,
    ssid: String,
    rssi: i32,
    channel: Option<u32>,
    frequency_khz: Option<u64>,
    encryption: bool,
) -> WifiDevice {
    let channel = channel
        .or_else(|| {
            frequency_khz
                .and_then(|khz| u32::try_from(khz / 1000).ok())
                .and_then(wifi_mhz_to_channel)
        })
        .unwrap_or(0);
    let frequency_khz = frequency_khz.or_else(|| wifi_channel_to_mhz(channel).map(|mhz| u64::from(mhz) * 1000));

    WifiDevice {
        manufacturer: manufacturer_or_unknown(&mac).to_string(),
        mac_address: mac,
        ssid,
        rssi,
        channel,
        encryption,
        frequency_khz,
    }
}

/// Splits an nmcli terse line on unescaped colons.
fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}
