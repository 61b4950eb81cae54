//! Persisted node identity.

mod store;
mod types;

pub use store::NodeStore;
pub use types::{
    local_hostname, NodeConfig, NodeError, NodeIdentity, MIN_SCAN_INTERVAL_MS, SUPPORTED_PLATFORM,
};
