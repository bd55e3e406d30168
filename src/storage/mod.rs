//! JSON files for the chain, the node registry and the pending pool.
//!
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so readers never observe a half-written document. Missing or
//! corrupt files load as `None` and the caller substitutes a default.

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::blockchain::Block;
use crate::config::NodeConfig;
use crate::error::Result;
use crate::network::NodeRegistry;
use crate::transaction::PendingPool;

#[derive(Debug, Clone)]
pub struct JsonStore {
    chain_path: PathBuf,
    nodes_path: PathBuf,
    pending_path: PathBuf,
}

impl JsonStore {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            chain_path: config.blockchain_file.clone(),
            nodes_path: config.nodes_file.clone(),
            pending_path: config.transactions_file.clone(),
        }
    }

    pub fn load_chain(&self) -> Option<Vec<Block>> {
        load_json(&self.chain_path)
    }

    pub fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        write_json_atomic(&self.chain_path, &blocks)
    }

    pub fn load_nodes(&self) -> Option<NodeRegistry> {
        load_json(&self.nodes_path)
    }

    pub fn save_nodes(&self, registry: &NodeRegistry) -> Result<()> {
        write_json_atomic(&self.nodes_path, registry)
    }

    pub fn load_pending(&self) -> Option<PendingPool> {
        load_json(&self.pending_path)
    }

    pub fn save_pending(&self, pool: &PendingPool) -> Result<()> {
        write_json_atomic(&self.pending_path, pool)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("STORAGE - cannot read {}: {e}; using default", path.display());
            return None;
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("STORAGE - corrupt {}: {e}; using default", path.display());
            None
        }
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let encoded = serde_json::to_vec_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, encoded)?;
    fs::rename(&tmp, path)?;
    debug!("STORAGE - wrote {}", path.display());
    Ok(())
}
