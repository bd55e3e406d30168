use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
use crate::transaction::Transaction;

/// A single block. `hash` is the canonical hash of this block (computed with
/// the `hash` field left out); `previous_hash` is the predecessor's `hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub proof: u64,
    pub hash: String,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
}

/// Current UTC time, fixed-width so timestamps also sort as strings.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Block {
    /// The fixed first block every node shares.
    pub fn genesis() -> Self {
        let mut block = Self {
            index: 0,
            timestamp: GENESIS_TIMESTAMP.to_string(),
            proof: GENESIS_PROOF,
            hash: String::new(),
            previous_hash: String::from(GENESIS_PREVIOUS_HASH),
            transactions: Vec::new(),
        };
        block.seal();
        block
    }

    /// Assemble and seal a block on top of a predecessor whose proof was
    /// already solved against.
    pub fn new(
        index: u64,
        proof: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp: timestamp_now(),
            proof,
            hash: String::new(),
            previous_hash,
            transactions,
        };
        block.seal();
        block
    }

    /// SHA-256 over the JSON form of the block with sorted keys and without
    /// its own `hash` field, so declaration order never affects the digest.
    pub fn canonical_hash(&self) -> String {
        let mut value = serde_json::to_value(self).expect("block serializes to JSON");
        if let Some(fields) = value.as_object_mut() {
            fields.remove("hash");
        }
        let encoded = serde_json::to_vec(&value).expect("serialize block");
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hex::encode(hasher.finalize())
    }

    /// Store the canonical hash in `hash`.
    pub fn seal(&mut self) {
        self.hash = self.canonical_hash();
    }

    /// Whether the stored `hash` still matches the block contents.
    pub fn is_sealed(&self) -> bool {
        self.hash == self.canonical_hash()
    }
}
