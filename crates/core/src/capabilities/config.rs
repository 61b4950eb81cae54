//! Configuration for the capability prober.

use serde::{Deserialize, Serialize};

/// Controls the optional package installation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    /// Attempt to install missing packages when running as root.
    #[serde(default)]
    pub auto_install: bool,

    /// Package manager executable.
    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    /// Timeout for the package index update in seconds.
    #[serde(default = "default_update_timeout")]
    pub update_timeout_secs: u64,

    /// Timeout for a single package install in seconds.
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
}

fn default_package_manager() -> String {
    "apt-get".to_string()
}

fn default_update_timeout() -> u64 {
    300
}

fn default_install_timeout() -> u64 {
    600
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            auto_install: false,
            package_manager: default_package_manager(),
            update_timeout_secs: default_update_timeout(),
            install_timeout_secs: default_install_timeout(),
        }
    }
}
