use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{LedgerError, Result};

/// Reduce `http://host:port/...` or `host:port` to `host:port`.
pub fn normalize_endpoint(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    let authority = without_scheme.split('/').next().unwrap_or_default();

    let invalid = || LedgerError::InvalidNode(raw.to_string());
    let (host, port) = authority.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if host.is_empty() || port == 0 || host.contains(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(format!("{host}:{port}"))
}

/// The curated peer set. Deduplicated; nodes are never removed.
/// Serialized as `{"nodes": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRegistry {
    nodes: BTreeSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, skipping malformed entries.
    pub fn from_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for endpoint in endpoints {
            if let Err(e) = registry.add(endpoint.as_ref()) {
                warn!("NODES - skipping {e}");
            }
        }
        registry
    }

    /// Register a node. Returns `true` if it was new.
    pub fn add(&mut self, endpoint: &str) -> Result<bool> {
        let node = normalize_endpoint(endpoint)?;
        Ok(self.nodes.insert(node))
    }

    /// Learn nodes from a peer's own registry, never adding `my_node`.
    /// Returns how many were new.
    pub fn merge<I, S>(&mut self, endpoints: I, my_node: &str) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        endpoints
            .into_iter()
            .filter_map(|e| normalize_endpoint(e.as_ref()).ok())
            .filter(|node| node != my_node)
            .filter(|node| self.nodes.insert(node.clone()))
            .count()
    }

    #[cfg(test)]
    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    /// Every registered node other than `my_node`.
    pub fn peers_except(&self, my_node: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.as_str() != my_node)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_forms() {
        assert_eq!(normalize_endpoint("127.0.0.1:5000").unwrap(), "127.0.0.1:5000");
        assert_eq!(normalize_endpoint(" http://127.0.0.1:5000/ ").unwrap(), "127.0.0.1:5000");
        assert_eq!(normalize_endpoint("https://node.local:80/get_chain").unwrap(), "node.local:80");
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for bad in ["", "127.0.0.1", ":5000", "host:0", "host:99999", "host:port", "a b:1"] {
            assert!(
                matches!(normalize_endpoint(bad), Err(LedgerError::InvalidNode(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn deduplicates() {
        let mut reg = NodeRegistry::new();
        assert!(reg.add("127.0.0.1:5001").unwrap());
        assert!(!reg.add("http://127.0.0.1:5001/").unwrap());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn merge_skips_self_and_garbage() {
        let mut reg = NodeRegistry::from_endpoints(["127.0.0.1:5001", "junk"]);
        assert_eq!(reg.len(), 1);
        let added = reg.merge(
            ["127.0.0.1:5000", "127.0.0.1:5001", "127.0.0.1:5002", "nope"],
            "127.0.0.1:5000",
        );
        assert_eq!(added, 1);
        assert!(!reg.contains("127.0.0.1:5000"));
        assert_eq!(reg.peers_except("127.0.0.1:5001"), vec!["127.0.0.1:5002"]);
    }

    #[test]
    fn serialized_shape() {
        let reg = NodeRegistry::from_endpoints(["b:2", "a:1"]);
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json, serde_json::json!({ "nodes": ["a:1", "b:2"] }));
    }
}
