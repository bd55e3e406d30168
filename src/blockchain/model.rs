use log::debug;

use super::{Block, pow};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// In-memory chain store. Mutated only by `append` and wholesale `replace`.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    difficulty: usize,
    dirty: bool,
}

impl Blockchain {
    /// A fresh chain holding only the genesis block.
    pub fn new(difficulty: usize) -> Self {
        Self {
            chain: vec![Self::create_genesis()],
            difficulty,
            dirty: true,
        }
    }

    /// Wrap blocks loaded from storage; an empty list becomes a new chain.
    pub fn from_blocks(blocks: Vec<Block>, difficulty: usize) -> Self {
        if blocks.is_empty() {
            return Self::new(difficulty);
        }
        Self {
            chain: blocks,
            difficulty,
            dirty: false,
        }
    }

    pub fn create_genesis() -> Block {
        Block::genesis()
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[cfg(test)]
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Build (but do not append) the block that follows the current tip.
    pub fn next_block(&self, proof: u64, transactions: Vec<Transaction>) -> Block {
        let tip = self.last_block();
        Block::new(tip.index + 1, proof, tip.hash.clone(), transactions)
    }

    /// Push a block to the end of the chain and mark the store dirty.
    /// Persisting is the caller's job.
    pub fn append(&mut self, block: Block) -> &Block {
        debug!("CHAIN - append block #{} ({})", block.index, block.hash);
        self.chain.push(block);
        self.dirty = true;
        self.last_block()
    }

    /// Atomically swap in a different chain. The candidate must pass
    /// `is_valid`; length policy is decided by the caller.
    pub fn replace(&mut self, blocks: Vec<Block>) -> Result<()> {
        if blocks.is_empty() || !is_valid(&blocks, self.difficulty) {
            return Err(LedgerError::InvalidChain);
        }
        self.chain = blocks;
        self.dirty = true;
        Ok(())
    }

    /// Validate the whole local chain.
    pub fn is_valid_chain(&self) -> bool {
        is_valid(&self.chain, self.difficulty)
    }

    /// Whether a transaction with the same signature and timestamp is
    /// already mined.
    pub fn contains_transaction(&self, tx: &Transaction) -> bool {
        self.chain
            .iter()
            .flat_map(|b| b.transactions.iter())
            .any(|t| t.signature == tx.signature && t.timestamp == tx.timestamp)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// A non-empty chain must start at the shared genesis block. Then, for every
/// consecutive pair: both blocks carry their own canonical hash, the link
/// points at the predecessor, indices are consecutive, the proofs satisfy
/// the puzzle and every transfer carries a valid signature. The empty chain
/// is valid.
pub fn is_valid(chain: &[Block], difficulty: usize) -> bool {
    if chain.first().is_some_and(|first| *first != Block::genesis()) {
        debug!("CHAIN - first block is not the genesis block");
        return false;
    }
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if !previous.is_sealed() || !current.is_sealed() {
            debug!("CHAIN - block #{} hash does not match contents", current.index);
            return false;
        }
        if current.previous_hash != previous.hash {
            debug!("CHAIN - block #{} breaks the hash link", current.index);
            return false;
        }
        if current.index != previous.index + 1 {
            debug!("CHAIN - block #{} has a non-consecutive index", current.index);
            return false;
        }
        if !pow::verify(previous.proof, current.proof, difficulty) {
            debug!("CHAIN - block #{} fails proof of work", current.index);
            return false;
        }
        if let Some(tx) = current.transactions.iter().find(|tx| !tx.verify_signature()) {
            debug!(
                "CHAIN - block #{} carries an unsigned transfer from {}",
                current.index, tx.sender_address
            );
            return false;
        }
    }
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use crate::wallet::generate_keypair;

    pub(crate) const DIFF: usize = 2;

    /// Solve and append one block on top of `bc`.
    pub(crate) fn mine_next(bc: &mut Blockchain, transactions: Vec<Transaction>) {
        let proof = pow::solve(bc.last_block().proof, bc.difficulty());
        let block = bc.next_block(proof, transactions);
        bc.append(block);
    }

    pub(crate) fn chain_of(len: usize) -> Blockchain {
        let mut bc = Blockchain::new(DIFF);
        while bc.len() < len {
            let reward = Transaction::reward("p2SbWoT9K0gJQf78leNZ1AgXjU0=", bc.len() as f64);
            mine_next(&mut bc, vec![reward]);
        }
        bc
    }

    #[test]
    fn appended_chain_is_valid() {
        let bc = chain_of(5);
        assert_eq!(bc.len(), 5);
        assert!(bc.is_valid_chain());
        assert_eq!(bc.last_block().index, 4);
    }

    #[test]
    fn empty_and_single_block_chains_are_valid() {
        assert!(is_valid(&[], DIFF));
        assert!(is_valid(&[Block::genesis()], DIFF));
    }

    #[test]
    fn tampered_proof_is_invalid() {
        let bc = chain_of(4);
        let mut blocks = bc.blocks().to_vec();
        blocks[2].proof += 1;
        assert!(!is_valid(&blocks, DIFF));
    }

    #[test]
    fn tampered_link_is_invalid() {
        let bc = chain_of(4);
        let mut blocks = bc.blocks().to_vec();
        blocks[3].previous_hash = "0".repeat(64);
        assert!(!is_valid(&blocks, DIFF));
    }

    #[test]
    fn tampered_amount_is_invalid_anywhere() {
        let bc = chain_of(4);
        for i in 1..4 {
            let mut blocks = bc.blocks().to_vec();
            blocks[i].transactions[0].amount += 1.0;
            assert!(!is_valid(&blocks, DIFF), "tampering block {i} went unnoticed");
        }
    }

    #[test]
    fn resealed_tampering_still_breaks_the_link() {
        let bc = chain_of(4);
        let mut blocks = bc.blocks().to_vec();
        blocks[1].transactions[0].amount = 1_000.0;
        blocks[1].seal();
        assert!(!is_valid(&blocks, DIFF));
    }

    #[test]
    fn replace_rejects_invalid_and_accepts_valid() {
        let mut local = Blockchain::new(DIFF);
        local.mark_clean();

        let mut bad = chain_of(3).blocks().to_vec();
        bad[1].proof = 0;
        assert!(matches!(local.replace(bad), Err(LedgerError::InvalidChain)));
        assert_eq!(local.len(), 1);
        assert!(!local.is_dirty());

        let good = chain_of(3).blocks().to_vec();
        local.replace(good.clone()).unwrap();
        assert_eq!(local.blocks(), good.as_slice());
        assert!(local.is_dirty());
    }

    #[test]
    fn resealed_forged_genesis_is_invalid() {
        let mut genesis = Block::genesis();
        genesis
            .transactions
            .push(Transaction::reward("p2SbWoT9K0gJQf78leNZ1AgXjU0=", 1_000_000.0));
        genesis.seal();
        let mut forged = Blockchain::from_blocks(vec![genesis], DIFF);
        mine_next(&mut forged, Vec::new());
        mine_next(&mut forged, Vec::new());

        assert!(!is_valid(&forged.blocks()[..1], DIFF));
        assert!(!is_valid(forged.blocks(), DIFF));
        let mut local = Blockchain::new(DIFF);
        assert!(matches!(
            local.replace(forged.blocks().to_vec()),
            Err(LedgerError::InvalidChain)
        ));
        assert_eq!(local.blocks(), &[Block::genesis()]);
    }

    #[test]
    fn forged_transfer_is_invalid_even_when_sealed() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let mut bc = Blockchain::new(DIFF);
        mine_next(&mut bc, vec![Transaction::reward(&alice.address, 10.0)]);

        let mut signed =
            Transaction::sign(&alice.private_key, &alice.public_key, &bob.address, 5.0).unwrap();
        let honest = signed.clone();
        signed.amount = 500.0;

        let mut forged = Blockchain::from_blocks(bc.blocks().to_vec(), DIFF);
        mine_next(&mut forged, vec![signed]);
        assert!(!forged.is_valid_chain());

        mine_next(&mut bc, vec![honest]);
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn from_empty_blocks_creates_genesis() {
        let bc = Blockchain::from_blocks(Vec::new(), DIFF);
        assert_eq!(bc.blocks(), &[Block::genesis()]);
        assert!(bc.is_dirty());
    }
}
