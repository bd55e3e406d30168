pub mod block;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::{Blockchain, is_valid};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Default miner reward per block.
pub const DEFAULT_MINING_REWARD: f64 = 50.0;

/// Proof stored in the genesis block; the first mined proof builds on it.
pub const GENESIS_PROOF: u64 = 100;

/// `previous_hash` sentinel of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Fixed genesis timestamp so every node starts from the same block.
pub const GENESIS_TIMESTAMP: &str = "2024-01-01T00:00:00.000000Z";
