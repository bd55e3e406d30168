//! The node's shared state: chain, pending pool and peer registry behind
//! their locks, plus the store and HTTP client used to persist and gossip.
//!
//! Every change to the chain or the pool happens under the `ledger` lock,
//! including the follow-up write to disk. Peer calls never run while a lock
//! is held.

use log::{error, info, warn};
use std::sync::Mutex;

use crate::blockchain::{Block, Blockchain};
use crate::config::NodeConfig;
use crate::error::{LedgerError, Result};
use crate::network::{NodeRegistry, PeerClient, normalize_endpoint};
use crate::storage::JsonStore;
use crate::transaction::{self, AccountStatement, PendingPool, Transaction};

#[derive(Debug)]
struct Ledger {
    chain: Blockchain,
    pending: PendingPool,
}

#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    ledger: Mutex<Ledger>,
    registry: Mutex<NodeRegistry>,
    store: JsonStore,
    pub(crate) client: PeerClient,
}

impl Node {
    /// Load persisted state, substituting defaults for anything missing or
    /// unreadable, and write the result back.
    pub fn open(config: NodeConfig) -> Result<Self> {
        let store = JsonStore::new(&config);

        let mut chain = match store.load_chain() {
            Some(blocks) => Blockchain::from_blocks(blocks, config.difficulty),
            None => Blockchain::new(config.difficulty),
        };
        if !chain.is_valid_chain() {
            warn!("NODE - stored chain is invalid; starting over from genesis");
            chain = Blockchain::new(config.difficulty);
        }

        let registry = store
            .load_nodes()
            .unwrap_or_else(|| NodeRegistry::from_endpoints(&config.seed_nodes));
        let pending = store.load_pending().unwrap_or_default();

        info!(
            "NODE - {} opened: {} blocks, {} pending, {} known nodes",
            config.my_node,
            chain.len(),
            pending.len(),
            registry.len()
        );

        let node = Self {
            client: PeerClient::new(config.peer_timeout)?,
            ledger: Mutex::new(Ledger { chain, pending }),
            registry: Mutex::new(registry),
            store,
            config,
        };
        {
            let mut ledger = node.ledger.lock().expect("mutex poisoned");
            node.persist(&mut ledger);
        }
        node.persist_registry(&node.registry.lock().expect("mutex poisoned"));
        Ok(node)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn my_node(&self) -> &str {
        &self.config.my_node
    }

    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.ledger.lock().expect("mutex poisoned").chain.blocks().to_vec()
    }

    pub fn chain_len(&self) -> usize {
        self.ledger.lock().expect("mutex poisoned").chain.len()
    }

    pub fn last_block(&self) -> Block {
        self.ledger
            .lock()
            .expect("mutex poisoned")
            .chain
            .last_block()
            .clone()
    }

    pub fn is_chain_valid(&self) -> bool {
        self.ledger.lock().expect("mutex poisoned").chain.is_valid_chain()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.ledger
            .lock()
            .expect("mutex poisoned")
            .pending
            .transactions()
            .to_vec()
    }

    pub fn nodes(&self) -> Vec<String> {
        self.registry.lock().expect("mutex poisoned").to_vec()
    }

    /// Peers to gossip with: every known node except this one.
    pub fn peers(&self) -> Vec<String> {
        self.registry
            .lock()
            .expect("mutex poisoned")
            .peers_except(&self.config.my_node)
    }

    /// Register every endpoint, or none if any is malformed.
    pub fn connect_nodes(&self, endpoints: &[String]) -> Result<Vec<String>> {
        let normalized = endpoints
            .iter()
            .map(|e| normalize_endpoint(e))
            .collect::<Result<Vec<_>>>()?;

        let mut registry = self.registry.lock().expect("mutex poisoned");
        let added = registry.merge(normalized, &self.config.my_node);
        if added > 0 {
            info!("NODES - registered {added} new node(s)");
            self.persist_registry(&registry);
        }
        Ok(registry.to_vec())
    }

    /// Merge nodes learned from a peer. Returns how many were new.
    pub(crate) fn learn_nodes(&self, endpoints: Vec<String>) -> usize {
        let mut registry = self.registry.lock().expect("mutex poisoned");
        let added = registry.merge(endpoints, &self.config.my_node);
        if added > 0 {
            info!("NODES - learned {added} node(s) from peers");
            self.persist_registry(&registry);
        }
        added
    }

    /// Whether `node` answers `/ping` within the peer timeout.
    pub async fn check_node(&self, node: &str) -> bool {
        self.client.ping(node).await
    }

    /// Sign and queue a transfer against the current chain and pool.
    pub fn submit_transaction(
        &self,
        private_key: &str,
        public_key: &str,
        recipient_address: &str,
        amount: f64,
    ) -> Result<Transaction> {
        let mut ledger = self.ledger.lock().expect("mutex poisoned");
        let Ledger { chain, pending } = &mut *ledger;
        let tx = transaction::submit(
            private_key,
            public_key,
            recipient_address,
            amount,
            chain.blocks(),
            pending,
        )?;
        self.persist(&mut ledger);
        Ok(tx)
    }

    pub fn balance_and_history(&self, address: &str) -> AccountStatement {
        let ledger = self.ledger.lock().expect("mutex poisoned");
        transaction::balance_and_history(
            ledger.chain.blocks(),
            ledger.pending.transactions(),
            address,
        )
    }

    /// Swap in `blocks` if it is still strictly longer than the local chain
    /// and valid. Returns `false` when the local chain caught up meanwhile.
    pub(crate) fn adopt_chain(&self, blocks: Vec<Block>) -> Result<bool> {
        let mut ledger = self.ledger.lock().expect("mutex poisoned");
        if blocks.len() <= ledger.chain.len() {
            return Ok(false);
        }
        let length = blocks.len();
        ledger.chain.replace(blocks)?;
        let Ledger { chain, pending } = &mut *ledger;
        let pruned = pending.prune_mined(chain);
        info!("CHAIN - adopted chain of length {length}; pruned {pruned} pending tx(s)");
        self.persist(&mut ledger);
        Ok(true)
    }

    /// Append a block solved on top of `solved_on`, carrying the pending pool
    /// plus a reward for `miner_address`. Fails with `StaleTip` if the tip
    /// changed while the proof was being searched.
    pub(crate) fn commit_mined_block(
        &self,
        solved_on: &Block,
        proof: u64,
        miner_address: &str,
    ) -> Result<Block> {
        let mut ledger = self.ledger.lock().expect("mutex poisoned");
        if ledger.chain.last_block().hash != solved_on.hash {
            return Err(LedgerError::StaleTip(solved_on.index + 1));
        }
        ledger
            .pending
            .push(Transaction::reward(miner_address, self.config.mining_reward));
        let transactions = ledger.pending.take();
        let block = ledger.chain.next_block(proof, transactions);
        ledger.chain.append(block.clone());
        self.persist(&mut ledger);
        Ok(block)
    }

    fn persist(&self, ledger: &mut Ledger) {
        if ledger.chain.is_dirty() {
            match self.store.save_chain(ledger.chain.blocks()) {
                Ok(()) => ledger.chain.mark_clean(),
                Err(e) => error!("STORAGE - failed to save chain: {e}"),
            }
        }
        if let Err(e) = self.store.save_pending(&ledger.pending) {
            error!("STORAGE - failed to save pending pool: {e}");
        }
    }

    fn persist_registry(&self, registry: &NodeRegistry) {
        if let Err(e) = self.store.save_nodes(registry) {
            error!("STORAGE - failed to save nodes: {e}");
        }
    }
}
