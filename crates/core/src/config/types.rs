use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::audio::AudioConfig;
use crate::capabilities::CapabilitiesConfig;
use crate::node::NodeConfig;
use crate::scanner::ScannerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ingest: Option<IngestConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Upstream ingestion endpoint for discoveries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Base URL; records are POSTed to `<url>/api/collector/push`.
    pub url: String,
    /// Bearer token
    #[serde(default)]
    pub api_key: String,
    /// Flush once this many records are queued (default: 50)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Flush at least this often (default: 5000)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    50
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_timeout() -> u64 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub node: NodeConfig,
    pub scanner: ScannerConfig,
    pub capabilities: CapabilitiesConfig,
    pub audio: AudioConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<SanitizedIngestConfig>,
}

/// Sanitized ingest config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIngestConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            node: config.node.clone(),
            scanner: config.scanner.clone(),
            capabilities: config.capabilities.clone(),
            audio: config.audio.clone(),
            ingest: config.ingest.as_ref().map(|i| SanitizedIngestConfig {
                url: i.url.clone(),
                api_key_configured: !i.api_key.is_empty(),
                batch_size: i.batch_size,
                flush_interval_ms: i.flush_interval_ms,
                timeout_secs: i.timeout_secs,
            }),
        }
    }
}
