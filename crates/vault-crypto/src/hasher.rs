use serde::Serialize;
use serde_json::Value;
use vault_types::ChainHash;

use crate::canonical::canonical_json;

/// Name of the field a record's own chain hash is stored under. It is the
/// one field left out of the canonical form.
pub const SELF_HASH_FIELD: &str = "vault_self_hash";

/// Canonicalization and chain-hash computation for ledger records.
pub struct RecordHasher;

impl RecordHasher {
    /// Canonical bytes of `record`: every serialized field except
    /// [`SELF_HASH_FIELD`], keys sorted, compact separators.
    ///
    /// `record` must serialize to a JSON object.
    pub fn canonicalize<T: Serialize>(record: &T) -> Result<Vec<u8>, HasherError> {
        let value =
            serde_json::to_value(record).map_err(|e| HasherError::Serialization(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(HasherError::NotAnObject);
        };
        fields.remove(SELF_HASH_FIELD);
        canonical_json(&Value::Object(fields))
    }

    /// `blake3(prev_hex || "|" || canonical)`.
    pub fn compute_self_hash(prev_hash: &ChainHash, canonical: &[u8]) -> ChainHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(prev_hash.to_hex().as_bytes());
        hasher.update(b"|");
        hasher.update(canonical);
        ChainHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Canonicalize then hash in one step.
    pub fn hash_record<T: Serialize>(
        prev_hash: &ChainHash,
        record: &T,
    ) -> Result<ChainHash, HasherError> {
        let canonical = Self::canonicalize(record)?;
        Ok(Self::compute_self_hash(prev_hash, &canonical))
    }
}

/// Content-identity hashing, independent of chain position.
pub struct ContentHasher;

impl ContentHasher {
    /// BLAKE3 of raw bytes.
    pub fn hash(data: &[u8]) -> ChainHash {
        ChainHash::from_hash(*blake3::hash(data).as_bytes())
    }

    /// BLAKE3 of `fields` joined with `|`.
    pub fn hash_fields(fields: &[&str]) -> ChainHash {
        Self::hash(fields.join("|").as_bytes())
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("record did not serialize to a JSON object")]
    NotAnObject,
}
