use serde::{Deserialize, Serialize};

use crate::blockchain::block::timestamp_now;
use crate::error::{LedgerError, Result};
use crate::wallet::{
    address_from_public_key, is_valid_address, parse_public_key, parse_secret_key, sign_payload,
    validate_key_pair, verify_payload,
};

/// Sender of miner-reward transactions. Never decodes as a valid address.
pub const REWARD_SENDER: &str = "0";

/// A value transfer. `signature` is hex DER over `sender|recipient|amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender_address: String,
    /// Hex compressed public key of the sender; empty for rewards.
    #[serde(default)]
    pub sender_public_key: String,
    pub recipient_address: String,
    pub amount: f64,
    pub timestamp: String,
    #[serde(default)]
    pub signature: String,
}

impl Transaction {
    /// Canonical signing payload.
    pub fn payload(sender_address: &str, recipient_address: &str, amount: f64) -> Vec<u8> {
        format!("{sender_address}|{recipient_address}|{amount}").into_bytes()
    }

    /// Validate and sign a transfer. Rejected before any signature is
    /// produced: non-positive amount, bad recipient checksum, self-transfer,
    /// keys that do not correspond. A signature that does not verify with
    /// the sender key is discarded as an error.
    pub fn sign(
        private_key_hex: &str,
        sender_public_key_hex: &str,
        recipient_address: &str,
        amount: f64,
    ) -> Result<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        let pk = parse_public_key(sender_public_key_hex)?;
        let sender_address = address_from_public_key(&pk);

        if !is_valid_address(recipient_address) {
            return Err(LedgerError::InvalidAddress(recipient_address.to_string()));
        }
        if sender_address == recipient_address {
            return Err(LedgerError::SelfTransfer);
        }

        let sk = parse_secret_key(private_key_hex)?;
        if !validate_key_pair(&sk, &pk) {
            return Err(LedgerError::KeyMismatch);
        }

        let payload = Self::payload(&sender_address, recipient_address, amount);
        let signature = sign_payload(&sk, &payload)?;
        if !verify_payload(&pk, &signature, &payload) {
            return Err(LedgerError::SignatureNotVerified);
        }

        Ok(Self {
            sender_address,
            sender_public_key: hex::encode(pk.serialize()),
            recipient_address: recipient_address.to_string(),
            amount,
            timestamp: timestamp_now(),
            signature,
        })
    }

    /// Check `signature` against the payload rebuilt from the public key's
    /// address. An invalid signature or key is a plain `false`.
    pub fn verify(
        public_key_hex: &str,
        signature: &str,
        recipient_address: &str,
        amount: f64,
    ) -> bool {
        let Ok(pk) = parse_public_key(public_key_hex) else {
            return false;
        };
        let sender_address = address_from_public_key(&pk);
        let payload = Self::payload(&sender_address, recipient_address, amount);
        verify_payload(&pk, signature, &payload)
    }

    /// Miner reward paid by the network.
    pub fn reward(miner_address: &str, amount: f64) -> Self {
        Self {
            sender_address: REWARD_SENDER.to_string(),
            sender_public_key: String::new(),
            recipient_address: miner_address.to_string(),
            amount,
            timestamp: timestamp_now(),
            signature: String::new(),
        }
    }

    pub fn is_reward(&self) -> bool {
        self.sender_address == REWARD_SENDER
    }

    /// Rewards are exempt; transfers must carry a key matching the sender
    /// address and a valid signature.
    pub fn verify_signature(&self) -> bool {
        if self.is_reward() {
            return true;
        }
        match parse_public_key(&self.sender_public_key) {
            Ok(pk) if address_from_public_key(&pk) == self.sender_address => Self::verify(
                &self.sender_public_key,
                &self.signature,
                &self.recipient_address,
                self.amount,
            ),
            _ => false,
        }
    }
}
