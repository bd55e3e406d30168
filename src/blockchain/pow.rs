//! Proof-of-Work puzzle: find `p` such that `sha256(str(p² - q²))` starts
//! with `difficulty` hex zeros, where `q` is the previous block's proof.

use sha2::{Digest, Sha256};

/// Hex digest of the puzzle for a (previous_proof, proof) pair, or `None`
/// when the squares do not fit the arithmetic range.
pub fn puzzle_digest(previous_proof: u64, proof: u64) -> Option<String> {
    let p = i128::from(proof);
    let q = i128::from(previous_proof);
    let value = p.checked_mul(p)?.checked_sub(q.checked_mul(q)?)?;
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    Some(hex::encode(hasher.finalize()))
}

fn meets_difficulty(digest: &str, difficulty: usize) -> bool {
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|c| c == b'0')
}

/// Brute-force the smallest positive proof for `previous_proof`.
/// CPU bound; callers run it off the async executor.
pub fn solve(previous_proof: u64, difficulty: usize) -> u64 {
    let mut proof: u64 = 1;
    loop {
        if verify(previous_proof, proof, difficulty) {
            return proof;
        }
        proof += 1;
    }
}

/// Single-hash check of a proof against its predecessor.
pub fn verify(previous_proof: u64, proof: u64, difficulty: usize) -> bool {
    puzzle_digest(previous_proof, proof).is_some_and(|d| meets_difficulty(&d, difficulty))
}
