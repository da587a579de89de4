use std::ops::ControlFlow;

use vault_types::ChainHash;

use crate::error::LedgerError;
use crate::records::{LedgerEntry, LedgerRecord, RecordDraft};

/// Write boundary for ledger appends.
pub trait LedgerWriter: Send + Sync {
    /// Link `draft` onto the current tail and persist it as one unit.
    ///
    /// Reading the tail, hashing, and writing form a single critical section
    /// with respect to every other append on the same store.
    fn append(&self, draft: RecordDraft) -> Result<LedgerRecord, LedgerError>;
}

/// Read boundary for audits and queries.
pub trait LedgerReader: Send + Sync {
    /// Self hash of the last record, or the genesis sentinel when the
    /// ledger is empty or absent.
    fn read_tail_hash(&self) -> Result<ChainHash, LedgerError>;

    /// Visit complete entries in order starting at `from`, until `visit`
    /// breaks or the ledger ends. Half-written data is never visited.
    fn scan_from(
        &self,
        from: usize,
        visit: &mut dyn FnMut(usize, LedgerEntry) -> ControlFlow<()>,
    ) -> Result<(), LedgerError>;

    /// Number of complete entries, unreadable ones included.
    fn len(&self) -> Result<usize, LedgerError> {
        let mut count = 0;
        self.scan_from(0, &mut |_, _| {
            count += 1;
            ControlFlow::Continue(())
        })?;
        Ok(count)
    }

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Records from `from` to the end. Fails on the first unreadable entry.
    fn read_from(&self, from: usize) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut records = Vec::new();
        let mut corrupt = None;
        self.scan_from(from, &mut |index, entry| match entry {
            LedgerEntry::Record(record) => {
                records.push(record);
                ControlFlow::Continue(())
            }
            LedgerEntry::Unreadable { reason } => {
                corrupt = Some(LedgerError::CorruptRecord {
                    line: index + 1,
                    reason,
                });
                ControlFlow::Break(())
            }
        })?;
        match corrupt {
            Some(err) => Err(err),
            None => Ok(records),
        }
    }

    fn read_all(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        self.read_from(0)
    }
}
