use thiserror::Error;

/// Every failure the ledger engine can surface.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("sender and recipient cannot be the same address")]
    SelfTransfer,
    #[error("address is invalid: {0:?}")]
    InvalidAddress(String),
    #[error("amount must be > 0")]
    NonPositiveAmount,
    #[error("insufficient balance: available {balance}, requested {amount}")]
    InsufficientBalance { balance: f64, amount: f64 },
    #[error("private key and public key do not correspond")]
    KeyMismatch,
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),
    #[error("produced signature does not verify")]
    SignatureNotVerified,

    #[error("candidate chain is invalid")]
    InvalidChain,
    #[error("chain tip moved while mining block #{0}")]
    StaleTip(u64),
    #[error("mining worker failed: {0}")]
    Worker(String),

    #[error("invalid node endpoint: {0}")]
    InvalidNode(String),
    #[error("peer {node} unavailable: {reason}")]
    Peer { node: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Validation errors reject a request synchronously and never mutate state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::SelfTransfer
                | LedgerError::InvalidAddress(_)
                | LedgerError::NonPositiveAmount
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::KeyMismatch
                | LedgerError::InvalidKey(_)
                | LedgerError::InvalidSignature(_)
                | LedgerError::SignatureNotVerified
                | LedgerError::InvalidNode(_)
        )
    }

    pub(crate) fn peer(node: &str, reason: impl ToString) -> Self {
        LedgerError::Peer {
            node: node.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
