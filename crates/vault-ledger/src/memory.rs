use std::ops::ControlFlow;
use std::sync::RwLock;

use tracing::debug;
use vault_types::ChainHash;

use crate::error::LedgerError;
use crate::records::{LedgerEntry, LedgerRecord, RecordDraft};
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory ledger for tests, local demos, and embedding.
///
/// The write lock is held across tail lookup, sealing, and push, so
/// concurrent appends serialize exactly as they do on [`crate::FileLedger`].
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<Vec<LedgerRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite a stored record in place, bypassing the chain.
    #[cfg(test)]
    pub(crate) fn tamper(&self, index: usize, edit: impl FnOnce(&mut LedgerRecord)) {
        let mut records = self.inner.write().unwrap();
        edit(&mut records[index]);
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append(&self, draft: RecordDraft) -> Result<LedgerRecord, LedgerError> {
        let mut records = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;
        let prev_hash = records
            .last()
            .map_or(ChainHash::GENESIS, |r| r.vault_self_hash);
        let record = draft.seal(prev_hash)?;
        records.push(record.clone());
        debug!(index = records.len() - 1, asset_id = %record.asset_id, "memory ledger append");
        Ok(record)
    }
}

impl LedgerReader for InMemoryLedger {
    fn read_tail_hash(&self) -> Result<ChainHash, LedgerError> {
        let records = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(records
            .last()
            .map_or(ChainHash::GENESIS, |r| r.vault_self_hash))
    }

    fn scan_from(
        &self,
        from: usize,
        visit: &mut dyn FnMut(usize, LedgerEntry) -> ControlFlow<()>,
    ) -> Result<(), LedgerError> {
        let records = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        for (index, record) in records.iter().enumerate().skip(from) {
            if visit(index, LedgerEntry::Record(record.clone())).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned)?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::tests::draft;

    #[test]
    fn append_links_records() {
        let ledger = InMemoryLedger::new();
        let a = ledger.append(draft(1)).unwrap();
        let b = ledger.append(draft(2)).unwrap();
        assert!(a.vault_prev_hash.is_genesis());
        assert_eq!(b.vault_prev_hash, a.vault_self_hash);
        assert_eq!(ledger.read_tail_hash().unwrap(), b.vault_self_hash);
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn empty_tail_is_genesis() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.read_tail_hash().unwrap().is_genesis());
        assert!(ledger.is_empty().unwrap());
        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn read_from_skips_prefix() {
        let ledger = InMemoryLedger::new();
        for i in 0..4 {
            ledger.append(draft(i)).unwrap();
        }
        let suffix = ledger.read_from(2).unwrap();
        assert_eq!(suffix.len(), 2);
        assert_eq!(suffix[0].source_reference, "V2");
    }

    #[test]
    fn concurrent_appends_serialize() {
        let ledger = InMemoryLedger::new();
        std::thread::scope(|s| {
            for t in 0..4u32 {
                let ledger = &ledger;
                s.spawn(move || {
                    for i in 0..25u32 {
                        ledger.append(draft(t * 100 + i)).unwrap();
                    }
                });
            }
        });
        let records = ledger.read_all().unwrap();
        assert_eq!(records.len(), 100);
        for pair in records.windows(2) {
            assert_eq!(pair[1].vault_prev_hash, pair[0].vault_self_hash);
        }
    }
}
