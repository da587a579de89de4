use thiserror::Error;

/// Errors produced by type parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// Malformed or out-of-enumeration issuance input.
///
/// Raised before anything touches the ledger, so a validation failure never
/// leaves a record behind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown asset type {0:?}; expected one of FEATURE, EPIC, BUILD, SERVICE, ARTIFACT")]
    UnknownAssetType(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}
