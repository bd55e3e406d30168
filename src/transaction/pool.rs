use serde::{Deserialize, Serialize};

use super::Transaction;
use crate::blockchain::Blockchain;

/// FIFO of accepted, not-yet-mined transactions.
/// Serialized as `{"transactions": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Drain the pool in arrival order, leaving it empty.
    pub fn take(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Drop transactions already mined into `chain`. Returns how many went.
    pub fn prune_mined(&mut self, chain: &Blockchain) -> usize {
        let before = self.transactions.len();
        self.transactions.retain(|tx| !chain.contains_transaction(tx));
        before - self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::PendingPool;
    use crate::blockchain::model::tests::{DIFF, mine_next};
    use crate::blockchain::Blockchain;
    use crate::transaction::Transaction;

    #[test]
    fn take_preserves_order_and_empties() {
        let mut pool = PendingPool::new();
        pool.push(Transaction::reward("a", 1.0));
        pool.push(Transaction::reward("b", 2.0));
        let drained = pool.take();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].recipient_address, "a");
        assert!(pool.is_empty());
    }

    #[test]
    fn prune_drops_mined_transactions() {
        let mined = Transaction::reward("a", 1.0);
        let mut other = Transaction::reward("b", 2.0);
        other.timestamp = "2099-01-01T00:00:00.000000Z".into();

        let mut bc = Blockchain::new(DIFF);
        mine_next(&mut bc, vec![mined.clone()]);

        let mut pool = PendingPool::new();
        pool.push(mined);
        pool.push(other);
        assert_eq!(pool.prune_mined(&bc), 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.transactions()[0].recipient_address, "b");
    }

    #[test]
    fn serialized_shape() {
        let json = serde_json::to_value(PendingPool::new()).unwrap();
        assert_eq!(json, serde_json::json!({ "transactions": [] }));
    }
}
