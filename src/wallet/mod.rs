use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// Bytes of the public-key hash kept in an address.
pub const ADDRESS_LENGTH: usize = 16;
/// Bytes of checksum appended to the truncated hash.
pub const CHECKSUM_LENGTH: usize = 4;

const KEY_CHECK_MESSAGE: &[u8] = b"validate_keys";

/// A freshly generated wallet. Keys are hex; the engine never stores them.
#[derive(Debug, Clone, Serialize)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Generate a new secp256k1 key pair and its address.
pub fn generate_keypair() -> KeyPair {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    KeyPair {
        private_key: hex::encode(sk.secret_bytes()),
        public_key: hex::encode(pk.serialize()),
        address: address_from_public_key(&pk),
    }
}

/// base64url(sha256(pubkey)[..16] ‖ sha256(that)[..4]).
pub fn address_from_public_key(pk: &PublicKey) -> String {
    let digest = sha256(&pk.serialize());
    let truncated = &digest[..ADDRESS_LENGTH];
    let checksum = &sha256(truncated)[..CHECKSUM_LENGTH];

    let mut full = Vec::with_capacity(ADDRESS_LENGTH + CHECKSUM_LENGTH);
    full.extend_from_slice(truncated);
    full.extend_from_slice(checksum);
    URL_SAFE.encode(full)
}

/// Check the embedded checksum of an address.
pub fn is_valid_address(address: &str) -> bool {
    let Ok(full) = URL_SAFE.decode(address.trim()) else {
        return false;
    };
    if full.len() != ADDRESS_LENGTH + CHECKSUM_LENGTH {
        return false;
    }
    let (truncated, checksum) = full.split_at(ADDRESS_LENGTH);
    sha256(truncated)[..CHECKSUM_LENGTH] == *checksum
}

pub fn parse_secret_key(private_key_hex: &str) -> Result<SecretKey> {
    let bytes =
        hex::decode(private_key_hex.trim()).map_err(|_| LedgerError::InvalidKey("private key hex"))?;
    SecretKey::from_slice(&bytes).map_err(|_| LedgerError::InvalidKey("private key bytes"))
}

pub fn parse_public_key(public_key_hex: &str) -> Result<PublicKey> {
    let bytes =
        hex::decode(public_key_hex.trim()).map_err(|_| LedgerError::InvalidKey("public key hex"))?;
    PublicKey::from_slice(&bytes).map_err(|_| LedgerError::InvalidKey("public key bytes"))
}

/// ECDSA over SHA-256 of `payload`, returned as hex DER.
pub fn sign_payload(sk: &SecretKey, payload: &[u8]) -> Result<String> {
    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest_slice(&sha256(payload))
        .map_err(|_| LedgerError::InvalidSignature("message length"))?;
    let sig = secp.sign_ecdsa(&msg, sk);
    Ok(hex::encode(&sig.serialize_der()[..]))
}

/// Verify a hex DER signature over SHA-256 of `payload`. Malformed
/// signatures verify as `false`.
pub fn verify_payload(pk: &PublicKey, signature_hex: &str, payload: &[u8]) -> bool {
    let secp = Secp256k1::verification_only();
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(sig) = Signature::from_der(&sig_bytes) else {
        return false;
    };
    let Ok(msg) = Message::from_digest_slice(&sha256(payload)) else {
        return false;
    };
    secp.verify_ecdsa(&msg, &sig, pk).is_ok()
}

/// Whether `pk` belongs to `sk`, checked by signing and verifying a fixed
/// test message.
pub fn validate_key_pair(sk: &SecretKey, pk: &PublicKey) -> bool {
    match sign_payload(sk, KEY_CHECK_MESSAGE) {
        Ok(sig) => verify_payload(pk, &sig, KEY_CHECK_MESSAGE),
        Err(_) => false,
    }
}
