use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("validation error: {0}")]
    Validation(#[from] vault_types::ValidationError),

    #[error("ledger error: {0}")]
    Ledger(#[from] vault_ledger::LedgerError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
