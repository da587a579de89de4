use std::io;

use vault_crypto::HasherError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Storage unavailable or a write failed. A failed append leaves no
    /// record behind.
    #[error("ledger I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unreadable record on line {line}: {reason}")]
    CorruptRecord { line: usize, reason: String },

    #[error("corrupt ledger tail at byte {offset}: {reason}")]
    CorruptTail { offset: u64, reason: String },

    #[error("invalid range: index {from} is past the end of a ledger with {len} records")]
    InvalidRange { from: usize, len: usize },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl From<HasherError> for LedgerError {
    fn from(e: HasherError) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
