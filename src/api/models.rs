use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::Block;
use crate::miner::{MinerManager, MinerStatus};
use crate::node::Node;

/// Shared application state: the node itself and its mining loop.
pub struct AppState {
    pub node: Arc<Node>,
    pub miner: MinerManager,
}

impl AppState {
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            node,
            miner: MinerManager::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/* ---------- Wallet API Models ---------- */

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub message: &'static str,
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct AddTransactionRequest {
    #[serde(alias = "private_key")]
    pub private_key_sender: String,
    #[serde(alias = "public_key")]
    pub public_key_sender: String,
    pub recipient_address: String,
    pub amount: f64,
}

#[derive(Serialize)]
pub struct AddTransactionResponse {
    pub message: &'static str,
    pub transaction: crate::transaction::Transaction,
}

#[derive(Deserialize)]
pub struct BalanceRequest {
    pub address: String,
}

/* ---------- Miner API Models ---------- */

#[derive(Deserialize)]
pub struct StartMiningQuery {
    pub miner_address: Option<String>,
}

#[derive(Serialize)]
pub struct MinerStatusResponse {
    pub status: MinerStatus,
    pub miner_address: Option<String>,
    pub height: usize,
    pub pending: usize,
}

#[derive(Serialize)]
pub struct ActualChainResponse {
    pub message: &'static str,
    pub actual_chain: Vec<Block>,
    pub length: usize,
}

#[derive(Serialize)]
pub struct UpdateChainResponse {
    pub message: &'static str,
    pub replaced: bool,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidityResponse {
    pub message: &'static str,
    pub valid: bool,
    pub length: usize,
}

/* ---------- Node API Models ---------- */

#[derive(Serialize)]
pub struct Reachability {
    pub node: String,
    pub reachable: bool,
}

#[derive(Serialize)]
pub struct ConnectNodeResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
    pub reachability: Vec<Reachability>,
}
