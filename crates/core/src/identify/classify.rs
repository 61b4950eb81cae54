//! Bluetooth device-type classification and Wi-Fi channel conversion.

/// Fallback device type when no keyword matches.
pub const GENERIC_BLUETOOTH: &str = "Bluetooth Device";

// Checked in order, first category with a matching keyword wins.
const DEVICE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Audio / Headphones",
        &["airpod", "buds", "earbuds", "wf-", "wh-", "jbl", "beats"],
    ),
    ("Wearable", &["watch", "band", "fitbit", "garmin"]),
    ("Smartphone", &["iphone", "galaxy", "pixel", "phone"]),
    ("Tablet", &["ipad", "tablet", "tab"]),
    ("Tracker", &["tile", "airtag", "smarttag"]),
    ("Peripheral", &["keyboard", "mouse", "controller"]),
    ("Smart Speaker", &["speaker", "sonos", "echo", "homepod"]),
    ("Smart TV / Streaming", &["tv", "roku", "fire", "chromecast"]),
    ("Smart Home", &["ring", "nest", "wyze", "cam"]),
];

/// Classifies a Bluetooth device from its advertised name.
pub fn classify_bluetooth_device(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    DEVICE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(GENERIC_BLUETOOTH)
}

/// Centre frequency in MHz for a Wi-Fi channel number.
pub fn wifi_channel_to_mhz(channel: u32) -> Option<u32> {
    match channel {
        1..=13 => Some(2407 + 5 * channel),
        14 => Some(2484),
        36..=165 => Some(5000 + 5 * channel),
        _ => None,
    }
}

/// Wi-Fi channel number for a centre frequency in MHz.
pub fn wifi_mhz_to_channel(mhz: u32) -> Option<u32> {
    match mhz {
        2484 => Some(14),
        2412..=2472 if (mhz - 2407) % 5 == 0 => Some((mhz - 2407) / 5),
        5180..=5825 if mhz % 5 == 0 => Some((mhz - 5000) / 5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_keyword() {
        assert_eq!(classify_bluetooth_device("Jane's AirPods Pro"), "Audio / Headphones");
        assert_eq!(classify_bluetooth_device("WH-1000XM4"), "Audio / Headphones");
        assert_eq!(classify_bluetooth_device("Galaxy Watch5"), "Wearable");
        assert_eq!(classify_bluetooth_device("Pixel 7"), "Smartphone");
        assert_eq!(classify_bluetooth_device("Tile Mate"), "Tracker");
        assert_eq!(classify_bluetooth_device("MX Keyboard"), "Peripheral");
        assert_eq!(classify_bluetooth_device("Living Room Sonos"), "Smart Speaker");
    }

    #[test]
    fn test_classify_fallback() {
        assert_eq!(classify_bluetooth_device(""), GENERIC_BLUETOOTH);
        assert_eq!(classify_bluetooth_device("XQ-7"), GENERIC_BLUETOOTH);
    }

    #[test]
    fn test_channel_to_mhz() {
        assert_eq!(wifi_channel_to_mhz(1), Some(2412));
        assert_eq!(wifi_channel_to_mhz(6), Some(2437));
        assert_eq!(wifi_channel_to_mhz(14), Some(2484));
        assert_eq!(wifi_channel_to_mhz(36), Some(5180));
        assert_eq!(wifi_channel_to_mhz(149), Some(5745));
        assert_eq!(wifi_channel_to_mhz(0), None);
        assert_eq!(wifi_channel_to_mhz(20), None);
    }

    #[test]
    fn test_mhz_to_channel_inverts() {
        for ch in (1..=14).chain([36, 40, 44, 48, 100, 149, 165]) {
            let mhz = wifi_channel_to_mhz(ch).unwrap();
            assert_eq!(wifi_mhz_to_channel(mhz), Some(ch));
        }
        assert_eq!(wifi_mhz_to_channel(2413), None);
        assert_eq!(wifi_mhz_to_channel(900), None);
    }
}
