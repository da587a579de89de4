use serde::{Deserialize, Serialize};
use vault_ledger::LedgerRecord;
use vault_types::{ChainHash, LedgerTimestamp};

/// What a caller gets back from a successful issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub asset_id: String,
    pub timestamp: LedgerTimestamp,
    pub audit_hash: ChainHash,
    pub parent_asset_id: Option<String>,
    pub glyph: String,
}

impl From<&LedgerRecord> for Receipt {
    fn from(record: &LedgerRecord) -> Self {
        Self {
            asset_id: record.asset_id.clone(),
            timestamp: record.timestamp,
            audit_hash: record.audit_hash,
            parent_asset_id: record.parent_asset_id.clone(),
            glyph: record.glyph.clone(),
        }
    }
}
