//! Capability prober.
//!
//! Detects which scanning and audio tools are installed and, when explicitly
//! enabled and running as root, tries to install the missing packages. The
//! resulting [`CapabilityReport`] drives per-medium availability.

mod config;
mod prober;
mod types;

pub use config::CapabilitiesConfig;
pub use prober::CapabilityProber;
pub use types::{
    package_for, CapabilityReport, MediumAvailability, ToolRequirement, ToolStatus, APLAY,
    BLUETOOTHCTL, GPSPIPE, HCITOOL, IWLIST, NMCLI, REQUIRED_TOOLS, RTL_FM, RTL_POWER, SOX_PLAY,
};
