use serde::{Deserialize, Serialize};
use vault_crypto::{ChainLinked, HasherError, RecordHasher};
use vault_types::{AssetType, ChainHash, LedgerTimestamp};

use crate::error::LedgerError;

/// One persisted issuance, immutable once appended.
///
/// Field names are the on-disk JSON keys; the canonical hashing form sorts
/// them, so declaration order here carries no meaning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerRecord {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub project_id: String,
    pub source_reference: String,
    /// Back-reference to another record's `asset_id`. Written as `null`
    /// when absent so the canonical form always carries the key.
    pub parent_asset_id: Option<String>,
    pub timestamp: LedgerTimestamp,
    pub audit_hash: ChainHash,
    pub entropy: String,
    pub glyph: String,
    pub vault_prev_hash: ChainHash,
    pub vault_self_hash: ChainHash,
}

impl LedgerRecord {
    /// Recompute the self hash from this record's content and stored prev hash.
    pub fn recompute_self_hash(&self) -> Result<ChainHash, HasherError> {
        RecordHasher::hash_record(&self.vault_prev_hash, self)
    }

    /// `true` if `key` is this record's asset id, or its audit hash in hex.
    pub fn matches_key(&self, key: &str) -> bool {
        self.asset_id == key || self.audit_hash.to_hex().eq_ignore_ascii_case(key)
    }

    /// Parse one ledger line (without its terminating newline).
    pub fn from_line(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }

    /// Render as one ledger line, newline included.
    pub fn to_line(&self) -> Result<Vec<u8>, LedgerError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl ChainLinked for LedgerRecord {
    fn prev_hash(&self) -> ChainHash {
        self.vault_prev_hash
    }

    fn self_hash(&self) -> ChainHash {
        self.vault_self_hash
    }

    fn canonical_bytes(&self) -> Result<Vec<u8>, HasherError> {
        RecordHasher::canonicalize(self)
    }
}

/// Everything an issuance supplies; the store fills in the chain fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDraft {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub project_id: String,
    pub source_reference: String,
    pub parent_asset_id: Option<String>,
    pub timestamp: LedgerTimestamp,
    pub audit_hash: ChainHash,
    pub entropy: String,
    pub glyph: String,
}

impl RecordDraft {
    /// Link the draft onto `prev_hash` and compute its self hash.
    pub fn seal(self, prev_hash: ChainHash) -> Result<LedgerRecord, LedgerError> {
        let mut record = LedgerRecord {
            asset_id: self.asset_id,
            asset_type: self.asset_type,
            project_id: self.project_id,
            source_reference: self.source_reference,
            parent_asset_id: self.parent_asset_id,
            timestamp: self.timestamp,
            audit_hash: self.audit_hash,
            entropy: self.entropy,
            glyph: self.glyph,
            vault_prev_hash: prev_hash,
            // Excluded from the canonical form; overwritten below.
            vault_self_hash: ChainHash::GENESIS,
        };
        record.vault_self_hash = record.recompute_self_hash()?;
        Ok(record)
    }
}

/// A position in the ledger as seen by a lenient reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEntry {
    Record(LedgerRecord),
    /// A complete line that does not parse as a record.
    Unreadable { reason: String },
}

impl LedgerEntry {
    /// Parse one complete line into an entry, never failing.
    pub fn parse_line(line: &[u8]) -> Self {
        match LedgerRecord::from_line(line) {
            Ok(record) => Self::Record(record),
            Err(e) => Self::Unreadable {
                reason: e.to_string(),
            },
        }
    }
}
