//! Append-only issuance ledger for the asset vault.
//!
//! This crate provides:
//! - The persisted `LedgerRecord` and the unchained `RecordDraft` it is sealed from
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `FileLedger`, a durable JSON Lines store with crash-tolerant tail reads
//! - `InMemoryLedger` for tests and embedding
//! - `ChainVerifier` for resumable integrity audits, lookup, and lineage

pub mod error;
pub mod file;
pub mod memory;
pub mod records;
pub mod tail;
pub mod traits;
pub mod verifier;

pub use error::LedgerError;
pub use file::{FileLedger, SyncMode};
pub use memory::InMemoryLedger;
pub use records::{LedgerEntry, LedgerRecord, RecordDraft};
pub use tail::TailProbe;
pub use traits::{LedgerReader, LedgerWriter};
pub use verifier::{
    ChainVerifier, Checkpoint, IntegrityViolation, VerificationResult, ViolationKind,
};
