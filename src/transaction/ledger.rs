use log::{debug, warn};
use serde::Serialize;

use super::{PendingPool, Transaction};
use crate::blockchain::Block;
use crate::error::{LedgerError, Result};

/// One transaction as seen from an address: `amount` is positive when
/// received and negative when sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub sender_address: String,
    pub recipient_address: String,
    pub amount: f64,
    pub timestamp: String,
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatement {
    pub address: String,
    pub balance: f64,
    pub transactions: Vec<HistoryEntry>,
}

/// Replay every mined transaction (oldest first) and then the pending pool.
/// Nothing is cached; the result depends only on the inputs.
pub fn balance_and_history(
    chain: &[Block],
    pending: &[Transaction],
    address: &str,
) -> AccountStatement {
    let mined = chain
        .iter()
        .flat_map(|b| b.transactions.iter())
        .map(|tx| (tx, true));
    let queued = pending.iter().map(|tx| (tx, false));

    let mut balance = 0.0;
    let mut transactions = Vec::new();
    for (tx, confirmed) in mined.chain(queued) {
        let signed_amount = if tx.recipient_address == address {
            tx.amount
        } else if tx.sender_address == address {
            -tx.amount
        } else {
            continue;
        };
        balance += signed_amount;
        transactions.push(HistoryEntry {
            sender_address: tx.sender_address.clone(),
            recipient_address: tx.recipient_address.clone(),
            amount: signed_amount,
            timestamp: tx.timestamp.clone(),
            confirmed,
        });
    }
    transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    AccountStatement {
        address: address.to_string(),
        balance,
        transactions,
    }
}

/// Sign a transfer and queue it. Nothing reaches the pool unless the
/// transfer validates, signs, and is covered by the sender's balance
/// (mined plus pending).
pub fn submit(
    private_key_hex: &str,
    public_key_hex: &str,
    recipient_address: &str,
    amount: f64,
    chain: &[Block],
    pool: &mut PendingPool,
) -> Result<Transaction> {
    let tx = Transaction::sign(private_key_hex, public_key_hex, recipient_address, amount)?;

    let balance = balance_and_history(chain, pool.transactions(), &tx.sender_address).balance;
    if amount > balance {
        warn!(
            "TX - rejected {} -> {}: balance {balance} < amount {amount}",
            tx.sender_address, tx.recipient_address
        );
        return Err(LedgerError::InsufficientBalance { balance, amount });
    }

    debug!(
        "TX - queued {} -> {} ({amount}); pool size {}",
        tx.sender_address,
        tx.recipient_address,
        pool.len() + 1
    );
    pool.push(tx.clone());
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use crate::blockchain::model::tests::{DIFF, mine_next};
    use crate::wallet::generate_keypair;

    #[test]
    fn balance_counts_mined_and_pending() {
        let a = generate_keypair();
        let b = generate_keypair();
        let mut bc = Blockchain::new(DIFF);
        mine_next(&mut bc, vec![Transaction::reward(&a.address, 50.0)]);

        let mut pool = PendingPool::new();
        submit(&a.private_key, &a.public_key, &b.address, 20.0, bc.blocks(), &mut pool).unwrap();

        let sa = balance_and_history(bc.blocks(), pool.transactions(), &a.address);
        assert_eq!(sa.balance, 30.0);
        assert_eq!(sa.transactions.len(), 2);
        assert_eq!(sa.transactions[0].amount, 50.0);
        assert!(sa.transactions[0].confirmed);
        assert_eq!(sa.transactions[1].amount, -20.0);
        assert!(!sa.transactions[1].confirmed);

        let sb = balance_and_history(bc.blocks(), pool.transactions(), &b.address);
        assert_eq!(sb.balance, 20.0);
    }

    #[test]
    fn replay_is_idempotent() {
        let a = generate_keypair();
        let mut bc = Blockchain::new(DIFF);
        mine_next(&mut bc, vec![Transaction::reward(&a.address, 10.0)]);
        mine_next(&mut bc, vec![Transaction::reward(&a.address, 5.0)]);

        let first = balance_and_history(bc.blocks(), &[], &a.address);
        let second = balance_and_history(bc.blocks(), &[], &a.address);
        assert_eq!(first, second);
        assert_eq!(first.balance, 15.0);
    }

    #[test]
    fn history_is_ordered_by_timestamp() {
        let mut late = Transaction::reward("addr", 1.0);
        late.timestamp = "2030-01-01T00:00:00.000000Z".into();
        let mut early = Transaction::reward("addr", 2.0);
        early.timestamp = "2020-01-01T00:00:00.000000Z".into();

        let st = balance_and_history(&[], &[late, early], "addr");
        assert_eq!(st.transactions[0].amount, 2.0);
        assert_eq!(st.transactions[1].amount, 1.0);
    }

    #[test]
    fn unknown_address_has_empty_statement() {
        let bc = Blockchain::new(DIFF);
        let st = balance_and_history(bc.blocks(), &[], "nobody");
        assert_eq!(st.balance, 0.0);
        assert!(st.transactions.is_empty());
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let a = generate_keypair();
        let b = generate_keypair();
        let mut bc = Blockchain::new(DIFF);
        mine_next(&mut bc, vec![Transaction::reward(&a.address, 50.0)]);

        let mut pool = PendingPool::new();
        let err = submit(&a.private_key, &a.public_key, &b.address, 50.5, bc.blocks(), &mut pool)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert!(pool.is_empty());

        // spending exactly the balance is allowed
        submit(&a.private_key, &a.public_key, &b.address, 50.0, bc.blocks(), &mut pool).unwrap();
        // pending spends count against the next one
        let err = submit(&a.private_key, &a.public_key, &b.address, 1.0, bc.blocks(), &mut pool)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn validation_errors_leave_pool_untouched() {
        let a = generate_keypair();
        let bc = Blockchain::new(DIFF);
        let mut pool = PendingPool::new();

        let err = submit(&a.private_key, &a.public_key, &a.address, 1.0, bc.blocks(), &mut pool)
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfTransfer));
        let err = submit(&a.private_key, &a.public_key, "x", 1.0, bc.blocks(), &mut pool)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAddress(_)));
        assert!(pool.is_empty());
    }
}
