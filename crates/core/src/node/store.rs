//! JSON file store for the node identity.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::types::{NodeConfig, NodeError, NodeIdentity};

/// Reads the identity file, creating or repairing it as needed.
#[derive(Debug, Clone)]
pub struct NodeStore {
    config: NodeConfig,
}

impl NodeStore {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.identity_path
    }

    /// Load the identity, generating and persisting a new one when the file
    /// is missing, unreadable, or has no `node_id`.
    ///
    /// Only fails when a regenerated identity cannot be written.
    pub fn load_or_create(&self) -> Result<NodeIdentity, NodeError> {
        let path = self.path();
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<NodeIdentity>(&text) {
                Ok(identity) if !identity.node_id.trim().is_empty() => return Ok(identity),
                Ok(_) => warn!("Node identity {} has no node_id, regenerating", path.display()),
                Err(e) => warn!("Node identity {} is corrupt ({}), regenerating", path.display(), e),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No node identity at {}, creating one", path.display());
            }
            Err(e) => warn!("Cannot read node identity {} ({}), regenerating", path.display(), e),
        }

        let identity = NodeIdentity::generate(&self.config);
        self.save(&identity)?;
        info!(
            "Created node identity {} ({})",
            identity.node_id, identity.node_name
        );
        Ok(identity)
    }

    /// Persist `identity`, creating parent directories.
    pub fn save(&self, identity: &NodeIdentity) -> Result<(), NodeError> {
        let path = self.path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(identity)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Store rooted at an explicit path with default creation settings.
impl From<PathBuf> for NodeStore {
    fn from(identity_path: PathBuf) -> Self {
        Self::new(NodeConfig {
            identity_path,
            ..Default::default()
        })
    }
}
