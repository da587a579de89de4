use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vault_types::ChainHash;

use crate::error::LedgerError;
use crate::records::{LedgerEntry, LedgerRecord, RecordDraft};
use crate::tail::{self, TailProbe};
use crate::traits::{LedgerReader, LedgerWriter};

/// Flush/sync strategy for appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fdatasync` before every append returns.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering. A reported append may be lost on
    /// power failure.
    OsDefault,
}

/// Durable JSON Lines ledger.
///
/// One record per `\n`-terminated line, in append order. The trailing
/// newline is the commit marker: bytes after the last newline belong to an
/// append that never completed and are invisible to readers.
///
/// Appends serialize on an internal mutex, which makes one `FileLedger` the
/// single writer for its path. Two instances on the same file are not
/// coordinated.
pub struct FileLedger {
    path: PathBuf,
    writer: Mutex<File>,
    sync_mode: SyncMode,
}

impl FileLedger {
    /// Open (or create) the ledger file at `path`.
    pub fn open(path: &Path, sync_mode: SyncMode) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        info!(path = %path.display(), bytes = file.metadata()?.len(), ?sync_mode, "opened ledger");
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(file),
            sync_mode,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Locate the tail, reporting which path found it.
    pub fn probe_tail(&self) -> Result<TailProbe, LedgerError> {
        match File::open(&self.path) {
            Ok(file) => tail::probe(&file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(TailProbe::Missing),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, mut file: &File, line: &[u8]) -> io::Result<()> {
        file.write_all(line)?;
        file.flush()?;
        if matches!(self.sync_mode, SyncMode::EveryWrite) {
            file.sync_data()?;
        }
        Ok(())
    }
}

impl LedgerWriter for FileLedger {
    /// A failed write or sync truncates the file back to where the record
    /// began. When only the sync fails, the complete line was already on
    /// disk for a moment, and a concurrent `scan_from` may have read it
    /// before the rollback.
    fn append(&self, draft: RecordDraft) -> Result<LedgerRecord, LedgerError> {
        let file = self.writer.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let len = file.metadata()?.len();
        let boundary = tail::last_boundary(&file, len)?;
        if boundary < len {
            warn!(
                offset = boundary,
                torn_bytes = len - boundary,
                "truncating unterminated ledger fragment"
            );
            file.set_len(boundary)?;
        }

        let prev_hash = tail::probe(&file)?.hash();
        let record = draft.seal(prev_hash)?;
        let line = record.to_line()?;

        if let Err(e) = self.write_record(&file, &line) {
            if let Err(rollback) = file.set_len(boundary) {
                warn!(error = %rollback, offset = boundary, "failed to roll back partial append");
            }
            return Err(e.into());
        }

        debug!(
            offset = boundary,
            len = line.len(),
            asset_id = %record.asset_id,
            prev = %prev_hash.short_hex(),
            hash = %record.vault_self_hash.short_hex(),
            "ledger append"
        );
        Ok(record)
    }
}

impl LedgerReader for FileLedger {
    fn read_tail_hash(&self) -> Result<ChainHash, LedgerError> {
        Ok(self.probe_tail()?.hash())
    }

    fn scan_from(
        &self,
        from: usize,
        visit: &mut dyn FnMut(usize, LedgerEntry) -> ControlFlow<()>,
    ) -> Result<(), LedgerError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut index = 0usize;
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 || line.last() != Some(&b'\n') {
                break;
            }
            if index >= from {
                let entry = LedgerEntry::parse_line(&line[..line.len() - 1]);
                if visit(index, entry).is_break() {
                    break;
                }
            }
            index += 1;
        }
        Ok(())
    }
}
