use vault_types::ChainHash;

use crate::hasher::{HasherError, RecordHasher};

/// Trait for records that participate in a hash chain.
pub trait ChainLinked {
    /// The stored hash of the predecessor (the genesis sentinel for the first).
    fn prev_hash(&self) -> ChainHash;
    /// The record's own stored chain hash.
    fn self_hash(&self) -> ChainHash;
    /// Canonical bytes the self hash commits to.
    fn canonical_bytes(&self) -> Result<Vec<u8>, HasherError>;
}

/// Hash chain integrity verifier.
///
/// A record links correctly when its stored prev hash equals the expected
/// predecessor and its stored self hash recomputes from its own canonical
/// content plus that prev hash.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Check one record at `index` against `expected_prev`.
    pub fn verify_link<R: ChainLinked + ?Sized>(
        index: usize,
        record: &R,
        expected_prev: &ChainHash,
    ) -> Result<(), ChainError> {
        let found = record.prev_hash();
        if found != *expected_prev {
            return Err(ChainError::PrevHashMismatch {
                index,
                expected: *expected_prev,
                found,
            });
        }

        let canonical = record
            .canonical_bytes()
            .map_err(|e| ChainError::Canonicalization {
                index,
                reason: e.to_string(),
            })?;
        let computed = RecordHasher::compute_self_hash(&found, &canonical);
        let stored = record.self_hash();
        if computed != stored {
            return Err(ChainError::SelfHashMismatch {
                index,
                stored,
                computed,
            });
        }
        Ok(())
    }

    /// Verify a whole slice starting from `seed`, which is the genesis
    /// sentinel for a chain that starts at its first record. Returns the tail
    /// hash (the seed itself for an empty slice).
    pub fn verify_chain<R: ChainLinked>(
        records: &[R],
        seed: ChainHash,
    ) -> Result<ChainHash, ChainError> {
        let mut expected_prev = seed;
        for (index, record) in records.iter().enumerate() {
            Self::verify_link(index, record, &expected_prev)?;
            expected_prev = record.self_hash();
        }
        Ok(expected_prev)
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("broken link at index {index}: expected prev hash {expected}, found {found}")]
    PrevHashMismatch {
        index: usize,
        expected: ChainHash,
        found: ChainHash,
    },

    #[error("self hash mismatch at index {index}: stored {stored}, computed {computed}")]
    SelfHashMismatch {
        index: usize,
        stored: ChainHash,
        computed: ChainHash,
    },

    #[error("cannot canonicalize record at index {index}: {reason}")]
    Canonicalization { index: usize, reason: String },
}
