//! Node identity types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Shortest interval the scan loop will sleep between cycles.
pub const MIN_SCAN_INTERVAL_MS: u64 = 1_000;

/// The only platform whose scanning tools are wired up.
pub const SUPPORTED_PLATFORM: &str = "linux";

/// Errors reading or writing the identity file.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node identity I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("node identity JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings used when creating a node identity for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Location of the persisted identity JSON.
    #[serde(default = "default_identity_path")]
    pub identity_path: PathBuf,

    /// Node name; the host name is used when unset.
    #[serde(default)]
    pub name: Option<String>,

    /// Scan interval written into a new identity.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Upstream target recorded in a new identity.
    #[serde(default)]
    pub sync_target: Option<String>,
}

fn default_identity_path() -> PathBuf {
    PathBuf::from("node.json")
}

fn default_scan_interval_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_platform() -> String {
    std::env::consts::OS.to_string()
}

fn default_role() -> String {
    "collector".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            identity_path: default_identity_path(),
            name: None,
            scan_interval_ms: default_scan_interval_ms(),
            sync_target: None,
        }
    }
}

/// Locally persisted identity and per-medium enable flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    #[serde(default = "default_true")]
    pub enable_ble: bool,
    #[serde(default = "default_true")]
    pub enable_wifi: bool,
    #[serde(default = "default_true")]
    pub enable_sdr: bool,
    #[serde(default = "default_true")]
    pub enable_gps: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_target: Option<String>,
}

impl NodeIdentity {
    /// Fresh identity with a random id and every medium enabled.
    pub fn generate(config: &NodeConfig) -> Self {
        Self {
            node_id: uuid::Uuid::new_v4().to_string(),
            node_name: config.name.clone().unwrap_or_else(local_hostname),
            platform: default_platform(),
            role: default_role(),
            scan_interval_ms: config.scan_interval_ms,
            enable_ble: true,
            enable_wifi: true,
            enable_sdr: true,
            enable_gps: true,
            sync_target: config.sync_target.clone(),
        }
    }

    /// Sleep between cycles, never shorter than [`MIN_SCAN_INTERVAL_MS`].
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.max(MIN_SCAN_INTERVAL_MS))
    }

    pub fn is_supported_platform(&self) -> bool {
        self.platform.eq_ignore_ascii_case(SUPPORTED_PLATFORM)
    }
}

impl Default for NodeIdentity {
    fn default() -> Self {
        Self::generate(&NodeConfig::default())
    }
}

/// Host name from `/etc/hostname` or `$HOSTNAME`.
pub fn local_hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "sigint-node".to_string())
}
