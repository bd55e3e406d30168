//! Longest-valid-chain consensus: pulling from peers, accepting pushed
//! chains and gossiping our own.

use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

use super::protocol::ChainResponse;
use crate::blockchain::{Block, is_valid};
use crate::error::Result;
use crate::node::Node;

/// What happened to a chain pushed by a peer.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteChainOutcome {
    Adopted { length: usize, nodes_updated: Vec<String> },
    NotLonger { local_length: usize },
    Invalid,
}

/// Pick the longest candidate that is strictly longer than `local_len` and
/// passes validation. Among equally long candidates the first one wins.
pub fn select_longest_valid(
    local_len: usize,
    candidates: Vec<(String, ChainResponse)>,
    difficulty: usize,
) -> Option<(String, Vec<Block>)> {
    let mut best: Option<(String, Vec<Block>)> = None;
    let mut best_len = local_len;

    for (node, response) in candidates {
        if response.length != response.chain.len() {
            warn!(
                "SYNC - {node} advertised length {} but sent {} blocks",
                response.length,
                response.chain.len()
            );
            continue;
        }
        if response.chain.len() <= best_len {
            debug!("SYNC - {node} chain ({}) is not longer", response.chain.len());
            continue;
        }
        if !is_valid(&response.chain, difficulty) {
            warn!("SYNC - {node} sent an invalid chain of length {}", response.chain.len());
            continue;
        }
        best_len = response.chain.len();
        best = Some((node, response.chain));
    }
    best
}

impl Node {
    /// Ask every known peer for its chain and node list, learn new nodes,
    /// and adopt the longest valid chain if it beats ours. Returns the
    /// adopted chain, if any.
    pub async fn reconcile(&self) -> Result<Option<Vec<Block>>> {
        let peers = self.peers();
        if peers.is_empty() {
            debug!("SYNC - no peers to reconcile with");
            return Ok(None);
        }

        let responses = join_all(peers.iter().map(|peer| async move {
            let chain = self.client.fetch_chain(peer).await;
            let nodes = match self.client.fetch_nodes(peer).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    debug!("SYNC - {e}");
                    Vec::new()
                }
            };
            (peer.clone(), chain, nodes)
        }))
        .await;

        let mut candidates = Vec::new();
        let mut learned = Vec::new();
        for (peer, chain, nodes) in responses {
            learned.extend(nodes);
            match chain {
                Ok(response) => candidates.push((peer, response)),
                Err(e) => warn!("SYNC - skipping {e}"),
            }
        }
        self.learn_nodes(learned);

        let local_len = self.chain_len();
        let Some((source, blocks)) =
            select_longest_valid(local_len, candidates, self.config().difficulty)
        else {
            info!("SYNC - local chain ({local_len}) is authoritative");
            return Ok(None);
        };

        if self.adopt_chain(blocks.clone())? {
            info!("SYNC - replaced local chain with {} blocks from {source}", blocks.len());
            Ok(Some(blocks))
        } else {
            info!("SYNC - local chain grew past {source}'s while syncing");
            Ok(None)
        }
    }

    /// Push `chain` to every peer not yet in `notified`, concurrently.
    /// This node is added to the list first so it is never re-notified.
    /// Returns how many peers accepted the push.
    pub async fn propagate(&self, chain: &[Block], mut notified: Vec<String>) -> usize {
        if !notified.iter().any(|n| n == self.my_node()) {
            notified.push(self.my_node().to_string());
        }
        let targets: Vec<String> = self
            .peers()
            .into_iter()
            .filter(|peer| !notified.contains(peer))
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let results = join_all(
            targets
                .iter()
                .map(|peer| self.client.push_chain(peer, chain, &notified)),
        )
        .await;

        let mut delivered = 0;
        for (peer, result) in targets.iter().zip(results) {
            match result {
                Ok(resp) => {
                    delivered += 1;
                    debug!("SYNC - {peer}: {}", resp.message);
                }
                Err(e) => warn!("SYNC - propagation failed: {e}"),
            }
        }
        info!("SYNC - chain of {} blocks sent to {delivered}/{} peer(s)", chain.len(), targets.len());
        delivered
    }

    /// Handle a chain pushed by a peer. When it replaces ours, keep the
    /// gossip going in the background with this node marked as notified.
    pub fn accept_remote_chain(
        self: &Arc<Self>,
        candidate: Vec<Block>,
        mut nodes_updated: Vec<String>,
    ) -> Result<RemoteChainOutcome> {
        let local_length = self.chain_len();
        if candidate.len() <= local_length {
            debug!(
                "SYNC - ignoring pushed chain ({}), local is {local_length}",
                candidate.len()
            );
            return Ok(RemoteChainOutcome::NotLonger { local_length });
        }
        if !is_valid(&candidate, self.config().difficulty) {
            warn!("SYNC - pushed chain of length {} is invalid", candidate.len());
            return Ok(RemoteChainOutcome::Invalid);
        }

        let length = candidate.len();
        if !self.adopt_chain(candidate.clone())? {
            return Ok(RemoteChainOutcome::NotLonger {
                local_length: self.chain_len(),
            });
        }

        if !nodes_updated.iter().any(|n| n == self.my_node()) {
            nodes_updated.push(self.my_node().to_string());
        }
        let node = Arc::clone(self);
        let notified = nodes_updated.clone();
        tokio::spawn(async move {
            node.propagate(&candidate, notified).await;
        });

        Ok(RemoteChainOutcome::Adopted {
            length,
            nodes_updated,
        })
    }
}
