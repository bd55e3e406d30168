//! JSON bodies exchanged between nodes.

use serde::{Deserialize, Serialize};

use crate::blockchain::Block;

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

/// `GET /get_chain`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// `GET /get_my_nodes`
#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    #[serde(default)]
    pub message: String,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEndpoint {
    pub node_address: String,
    pub port: u16,
}

impl NodeEndpoint {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.node_address, self.port)
    }
}

/// `POST /connect_node`
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectNodeRequest {
    pub nodes: Vec<NodeEndpoint>,
}

/// `POST /new_blockchain`
#[derive(Debug, Serialize, Deserialize)]
pub struct NewBlockchainRequest {
    pub chain: Vec<Block>,
    #[serde(default)]
    pub nodes_updated: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewBlockchainResponse {
    pub message: String,
    pub replaced: bool,
    pub length: usize,
    pub nodes_updated: Vec<String>,
}
