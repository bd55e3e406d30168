pub mod ledger;
pub mod model;
pub mod pool;

pub use ledger::{AccountStatement, balance_and_history, submit};
pub use model::Transaction;
pub use pool::PendingPool;
