use log::warn;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};

/// Per-node settings, built once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// This node's own `host:port`, as peers see it.
    pub my_node: String,
    pub blockchain_file: PathBuf,
    pub nodes_file: PathBuf,
    pub transactions_file: PathBuf,
    pub seed_nodes: Vec<String>,
    pub difficulty: usize,
    pub mining_reward: f64,
    pub miner_address: Option<String>,
    pub peer_timeout: Duration,
    pub mining_interval: Duration,
}

impl NodeConfig {
    /// Read the process environment. `.env` is loaded by `main` beforehand.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Missing or unparsable values
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8000);
        let my_node = lookup("MY_NODE").unwrap_or_else(|| format!("{host}:{port}"));

        let data_dir = PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| "./data".to_string()));
        let path_or = |key: &str, rel: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(rel))
        };

        let seed_nodes = lookup("LIST_NODE_VALID")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            blockchain_file: path_or("BLOCKCHAIN_FILE", "blockchain/block.json"),
            nodes_file: path_or("NODES_FILE", "nodes/nodes.json"),
            transactions_file: path_or("TRANSACTIONS_FILE", "transactions/transactions.json"),
            seed_nodes,
            difficulty: parse_or(&lookup, "MINING_DIFFICULTY", DEFAULT_DIFFICULTY),
            mining_reward: parse_or(&lookup, "MINING_REWARD", DEFAULT_MINING_REWARD),
            miner_address: lookup("MINER_PUBLIC_ADDRESS").filter(|a| !a.trim().is_empty()),
            peer_timeout: Duration::from_secs(parse_or(&lookup, "PEER_TIMEOUT_SECS", 5)),
            mining_interval: Duration::from_secs(parse_or(&lookup, "MINING_INTERVAL_SECS", 2)),
            host,
            port,
            my_node,
        }
    }

    /// Config rooted at `data_dir` with every other key at its default.
    #[cfg(test)]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir: PathBuf = data_dir.into();
        let dir = data_dir.to_string_lossy().into_owned();
        Self::from_lookup(move |key| (key == "DATA_DIR").then(|| dir.clone()))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("CONFIG - could not parse {key}={raw:?}, using default");
            default
        }),
        None => default,
    }
}
