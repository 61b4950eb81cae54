//! Capability report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An external tool the orchestrator can make use of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRequirement {
    /// Executable name looked up on PATH.
    pub tool: &'static str,
    /// Distribution package that provides the tool.
    pub package: &'static str,
    /// What the tool is used for.
    pub purpose: &'static str,
}

pub const HCITOOL: &str = "hcitool";
pub const BLUETOOTHCTL: &str = "bluetoothctl";
pub const IWLIST: &str = "iwlist";
pub const NMCLI: &str = "nmcli";
pub const RTL_POWER: &str = "rtl_power";
pub const RTL_FM: &str = "rtl_fm";
pub const APLAY: &str = "aplay";
pub const SOX_PLAY: &str = "play";
pub const GPSPIPE: &str = "gpspipe";

/// Every tool probed at startup, in report order.
pub const REQUIRED_TOOLS: &[ToolRequirement] = &[
    ToolRequirement {
        tool: HCITOOL,
        package: "bluez",
        purpose: "BLE passive scan",
    },
    ToolRequirement {
        tool: BLUETOOTHCTL,
        package: "bluez",
        purpose: "Bluetooth device listing",
    },
    ToolRequirement {
        tool: IWLIST,
        package: "wireless-tools",
        purpose: "Wi-Fi scan",
    },
    ToolRequirement {
        tool: NMCLI,
        package: "network-manager",
        purpose: "Wi-Fi scan (fallback)",
    },
    ToolRequirement {
        tool: RTL_POWER,
        package: "rtl-sdr",
        purpose: "SDR spectrum sweep",
    },
    ToolRequirement {
        tool: RTL_FM,
        package: "rtl-sdr",
        purpose: "SDR audio demodulation",
    },
    ToolRequirement {
        tool: APLAY,
        package: "alsa-utils",
        purpose: "Audio output",
    },
    ToolRequirement {
        tool: SOX_PLAY,
        package: "sox",
        purpose: "Audio output (alternative)",
    },
    ToolRequirement {
        tool: GPSPIPE,
        package: "gpsd-clients",
        purpose: "GPS position",
    },
];

/// Looks up the package that provides `tool`.
pub fn package_for(tool: &str) -> Option<&'static str> {
    REQUIRED_TOOLS
        .iter()
        .find(|r| r.tool == tool)
        .map(|r| r.package)
}

/// Probe result for a single tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub tool: String,
    pub package: String,
    pub purpose: String,
    pub available: bool,
    pub install_attempted: bool,
    /// Why the tool is still missing, or how to install it by hand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_error: Option<String>,
}

impl ToolStatus {
    pub fn new(requirement: &ToolRequirement, available: bool) -> Self {
        Self {
            tool: requirement.tool.to_string(),
            package: requirement.package.to_string(),
            purpose: requirement.purpose.to_string(),
            available,
            install_attempted: false,
            install_error: None,
        }
    }
}

/// Which scan media have the tooling they need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediumAvailability {
    pub ble: bool,
    pub wifi: bool,
    pub sdr: bool,
    pub gps: bool,
    pub audio: bool,
}

/// Snapshot produced by one capability check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub tools: Vec<ToolStatus>,
    /// Unset until the first check has run.
    pub checked_at: Option<DateTime<Utc>>,
    /// Whether the process ran with root privileges.
    pub privileged: bool,
    /// Whether the configured package manager was found.
    pub package_manager_available: bool,
}

impl CapabilityReport {
    /// Whether `tool` was found.
    pub fn is_available(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t.tool == tool && t.available)
    }

    /// Derives per-medium availability from the tool list.
    pub fn availability(&self) -> MediumAvailability {
        MediumAvailability {
            ble: self.is_available(HCITOOL) || self.is_available(BLUETOOTHCTL),
            wifi: self.is_available(IWLIST) || self.is_available(NMCLI),
            sdr: self.is_available(RTL_POWER),
            gps: self.is_available(GPSPIPE),
            audio: self.is_available(RTL_FM)
                && (self.is_available(APLAY) || self.is_available(SOX_PLAY)),
        }
    }

    /// Packages providing at least one missing tool, in report order.
    pub fn missing_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for status in self.tools.iter().filter(|t| !t.available) {
            if !packages.contains(&status.package) {
                packages.push(status.package.clone());
            }
        }
        packages
    }

    /// Whether no check has run yet.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
