//! Background mining: one loop per node that repeatedly seals the pending
//! pool into a block, pays itself the reward and gossips the new chain.

use log::{error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::blockchain::{Block, pow};
use crate::error::{LedgerError, Result};
use crate::node::Node;
use crate::wallet::is_valid_address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerStatus {
    Idle,
    Mining,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug)]
struct MinerState {
    status: MinerStatus,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    miner_address: Option<String>,
}

/// Owns the mining loop. At most one loop runs at a time; stopping takes
/// effect at the end of the current cycle. The loop itself returns the
/// manager to `Idle` when it exits, so an abandoned `stop` cannot wedge it.
#[derive(Debug)]
pub struct MinerManager {
    state: Arc<Mutex<MinerState>>,
}

impl Default for MinerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MinerManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MinerState {
                status: MinerStatus::Idle,
                running: Arc::new(AtomicBool::new(false)),
                task: None,
                miner_address: None,
            })),
        }
    }

    pub fn status(&self) -> MinerStatus {
        self.state.lock().expect("mutex poisoned").status
    }

    /// Address rewards are paid to while a loop is running.
    pub fn miner_address(&self) -> Option<String> {
        self.state.lock().expect("mutex poisoned").miner_address.clone()
    }

    pub fn start(&self, node: Arc<Node>, miner_address: String) -> Result<StartOutcome> {
        if !is_valid_address(&miner_address) {
            return Err(LedgerError::InvalidAddress(miner_address));
        }
        let mut state = self.state.lock().expect("mutex poisoned");
        if state.status != MinerStatus::Idle {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let running = Arc::new(AtomicBool::new(true));
        info!("MINER - starting, rewards to {miner_address}");
        state.task = Some(tokio::spawn(mining_loop(
            node,
            miner_address.clone(),
            Arc::clone(&running),
            Arc::clone(&self.state),
        )));
        state.running = running;
        state.miner_address = Some(miner_address);
        state.status = MinerStatus::Mining;
        Ok(StartOutcome::Started)
    }

    /// Ask the loop to finish its current cycle and wait for it.
    pub async fn stop(&self) -> StopOutcome {
        let (task, running) = {
            let mut state = self.state.lock().expect("mutex poisoned");
            if state.status != MinerStatus::Mining {
                return StopOutcome::NotRunning;
            }
            state.status = MinerStatus::Stopping;
            state.running.store(false, Ordering::Release);
            (state.task.take(), Arc::clone(&state.running))
        };

        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("MINER - loop ended abnormally: {e}");
            }
        }
        // A loop that panicked never reached its own reset.
        mark_idle(&self.state, &running);
        StopOutcome::Stopped
    }
}

/// Return to `Idle` if `running` still belongs to the current loop.
fn mark_idle(state: &Mutex<MinerState>, running: &Arc<AtomicBool>) {
    let mut state = state.lock().expect("mutex poisoned");
    if Arc::ptr_eq(&state.running, running) && state.status != MinerStatus::Idle {
        state.status = MinerStatus::Idle;
        state.miner_address = None;
        state.task = None;
        info!("MINER - stopped");
    }
}

async fn mining_loop(
    node: Arc<Node>,
    miner_address: String,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MinerState>>,
) {
    while running.load(Ordering::Acquire) {
        match node.mine_block(&miner_address).await {
            Ok(block) => info!(
                "MINER - block #{} sealed with {} tx(s)",
                block.index,
                block.transactions.len()
            ),
            Err(e @ LedgerError::StaleTip(_)) => warn!("MINER - {e}; retrying on new tip"),
            Err(e) => error!("MINER - {e}"),
        }
        if !running.load(Ordering::Acquire) {
            break;
        }
        tokio::time::sleep(node.config().mining_interval).await;
    }
    mark_idle(&state, &running);
}

impl Node {
    /// Solve the puzzle on the current tip, append a block with every
    /// pending transaction plus the reward, then push the chain to peers.
    pub async fn mine_block(&self, miner_address: &str) -> Result<Block> {
        let tip = self.last_block();
        let difficulty = self.config().difficulty;
        let previous_proof = tip.proof;

        let proof = tokio::task::spawn_blocking(move || pow::solve(previous_proof, difficulty))
            .await
            .map_err(|e| LedgerError::Worker(e.to_string()))?;

        let block = self.commit_mined_block(&tip, proof, miner_address)?;
        let chain = self.chain_snapshot();
        self.propagate(&chain, Vec::new()).await;
        Ok(block)
    }
}
