//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the two process seams, [`CommandRunner`] and
//! [`AudioBackend`], so scan cycles and audio sessions can be exercised
//! without radios or installed tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use sigint_core::testing::{fixtures, MockAudioBackend};
//!
//! let runner = fixtures::fully_equipped_runner().await;
//! let backend = MockAudioBackend::new();
//!
//! // Use in SignalOrchestrator::new(...)
//! ```
//!
//! [`CommandRunner`]: crate::process::CommandRunner
//! [`AudioBackend`]: crate::audio::AudioBackend

mod mock_audio;
mod mock_runner;

pub use mock_audio::MockAudioBackend;
pub use mock_runner::{MockResponse, MockRunner};

/// Captured tool output and helpers.
pub mod fixtures {
    use super::{MockResponse, MockRunner};
    use crate::capabilities::{
        APLAY, BLUETOOTHCTL, GPSPIPE, HCITOOL, IWLIST, NMCLI, RTL_FM, RTL_POWER,
    };

    /// `hcitool lescan`, cut short by its deadline.
    pub const HCITOOL_LESCAN: &str = "LE Scan ...\n\
        A4:83:E7:11:22:33 AirPods Pro\n\
        A4:83:E7:11:22:33 (unknown)\n\
        F4:F5:D8:01:02:03 Nest Mini\n\
        7C:D9:F4:00:00:01 (unknown)\n";

    /// `bluetoothctl devices`.
    pub const BLUETOOTHCTL_DEVICES: &str = "Device 88:C6:26:AA:BB:CC Tile\n\
        Device 00:1A:7D:DA:71:13 Logitech MX Keys\n\
        Device A4:83:E7:11:22:33 AirPods Pro\n";

    /// `iwlist wlan0 scan` with two cells.
    pub const IWLIST_SCAN: &str = r#"wlan0     Scan completed :
          Cell 01 - Address: C4:E9:84:12:34:56
                    Channel:6
                    Frequency:2.437 GHz (Channel 6)
                    Quality=70/70  Signal level=-40 dBm
                    Encryption key:on
                    ESSID:"HomeNet"
          Cell 02 - Address: B8:27:EB:AB:CD:EF
                    Channel:36
                    Frequency:5.18 GHz (Channel 36)
                    Quality=30/70  Signal level=-78 dBm
                    Encryption key:off
                    ESSID:"pi-hotspot"
"#;

    /// `nmcli -t -f BSSID,SSID,SIGNAL,CHAN,SECURITY,FREQ dev wifi list`.
    pub const NMCLI_WIFI: &str = "C4\\:E9\\:84\\:12\\:34\\:56:HomeNet:80:6:WPA2:2437 MHz\n\
        B8\\:27\\:EB\\:AB\\:CD\\:EF::35:36:--:5180 MHz\n";

    /// One `rtl_power -1` sweep over the FM broadcast band.
    pub const RTL_POWER_SWEEP: &str = "2024-05-01, 12:00:00, 88000000, 88100000, 25000, 10, -62.1, -38.4, -70.0, -71.2\n\
        2024-05-01, 12:00:00, 100000000, 100100000, 25000, 10, -30.5, -55.0, -44.0, -80.3\n";

    /// `gpspipe -w -n 10` with a 3D fix.
    pub const GPSPIPE_TPV: &str = r#"{"class":"VERSION","release":"3.22","rev":"3.22","proto_major":3,"proto_minor":14}
{"class":"DEVICES","devices":[{"class":"DEVICE","path":"/dev/ttyACM0","driver":"u-blox"}]}
{"class":"TPV","device":"/dev/ttyACM0","mode":3,"time":"2024-05-01T12:00:00.000Z","lat":51.5007,"lon":-0.1246,"altMSL":35.2,"speed":0.2,"track":90.0,"epx":3.1,"epy":4.2}
"#;

    /// A runner with every scanning tool installed and answering with the
    /// fixtures above.
    pub async fn fully_equipped_runner() -> MockRunner {
        let runner = MockRunner::new();
        runner
            .set_available([HCITOOL, BLUETOOTHCTL, IWLIST, NMCLI, RTL_POWER, RTL_FM, APLAY, GPSPIPE])
            .await;
        runner
            .respond("hcitool lescan", MockResponse::stdout(HCITOOL_LESCAN))
            .await;
        runner
            .respond("bluetoothctl devices", MockResponse::stdout(BLUETOOTHCTL_DEVICES))
            .await;
        runner.respond("iwlist", MockResponse::stdout(IWLIST_SCAN)).await;
        runner.respond("nmcli", MockResponse::stdout(NMCLI_WIFI)).await;
        runner.respond("rtl_power", MockResponse::stdout(RTL_POWER_SWEEP)).await;
        runner.respond("gpspipe", MockResponse::stdout(GPSPIPE_TPV)).await;
        runner
    }
}
