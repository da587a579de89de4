//! Locating the chain tail of a JSON Lines ledger without a full scan.
//!
//! The fast path seeks backward from the end of the file to the last
//! complete line. When the trailing bytes are not a complete, parseable
//! record (a crash mid-write, a truncated file), a forward scan over every
//! complete line recovers the last readable record instead.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::{debug, warn};
use vault_types::ChainHash;

use crate::error::LedgerError;
use crate::records::LedgerRecord;

const CHUNK: u64 = 4096;

/// How the tail was found. Every variant maps to a tail hash via
/// [`TailProbe::hash`], but callers can tell the cases apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TailProbe {
    /// No ledger file exists.
    Missing,
    /// The ledger file exists but holds no bytes.
    Empty,
    /// The last line was complete and parsed; found by seeking backward.
    Clean { hash: ChainHash, offset: u64 },
    /// The trailing bytes were unusable and a forward scan took over.
    /// `hash` is `None` when no complete line parsed at all.
    Recovered {
        hash: Option<ChainHash>,
        skipped: usize,
    },
}

impl TailProbe {
    /// The hash the next record must link to.
    pub fn hash(&self) -> ChainHash {
        match self {
            Self::Missing | Self::Empty => ChainHash::GENESIS,
            Self::Clean { hash, .. } => *hash,
            Self::Recovered { hash, .. } => hash.unwrap_or(ChainHash::GENESIS),
        }
    }
}

/// Probe an open ledger file.
pub(crate) fn probe(file: &File) -> Result<TailProbe, LedgerError> {
    let len = file.metadata()?.len();
    probe_at(file, len)
}

/// Probe assuming the file is `len` bytes long. A writer may truncate a
/// torn fragment between the stat and the reads, so a fast path that runs
/// out of bytes is a changing tail, not an I/O failure.
fn probe_at(file: &File, len: u64) -> Result<TailProbe, LedgerError> {
    if len == 0 {
        return Ok(TailProbe::Empty);
    }

    let defect = match read_last_line(file, len) {
        Ok((offset, line)) => match LedgerRecord::from_line(&line) {
            Ok(record) => {
                return Ok(TailProbe::Clean {
                    hash: record.vault_self_hash,
                    offset,
                })
            }
            Err(e) => LedgerError::CorruptTail {
                offset,
                reason: e.to_string(),
            },
        },
        Err(e @ LedgerError::CorruptTail { .. }) => e,
        Err(LedgerError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            LedgerError::CorruptTail {
                offset: 0,
                reason: format!("ledger shrank below {len} bytes during the tail read"),
            }
        }
        Err(e) => return Err(e),
    };

    warn!(error = %defect, "ledger tail unreadable; falling back to a full scan");
    let offset = match &defect {
        LedgerError::CorruptTail { offset, .. } => *offset,
        _ => 0,
    };
    scan_for_tail(file).map_err(|e| LedgerError::CorruptTail {
        offset,
        reason: format!("fallback scan failed: {e}"),
    })
}

/// Byte offset just past the last `\n` in the first `len` bytes, i.e. the
/// end of the last complete line (0 if there is none).
pub(crate) fn last_boundary(file: &File, len: u64) -> io::Result<u64> {
    Ok(find_last_newline(file, len)?.map_or(0, |pos| pos + 1))
}

/// Offset and bytes (newline excluded) of the final line, which must be
/// newline-terminated.
fn read_last_line(file: &File, len: u64) -> Result<(u64, Vec<u8>), LedgerError> {
    let end = len - 1;
    let mut reader = file;
    let mut last = [0u8; 1];
    reader.seek(SeekFrom::Start(end))?;
    reader.read_exact(&mut last)?;
    if last[0] != b'\n' {
        let start = last_boundary(file, len)?;
        return Err(LedgerError::CorruptTail {
            offset: start,
            reason: format!("{} trailing bytes without a newline", len - start),
        });
    }

    let start = find_last_newline(file, end)?.map_or(0, |pos| pos + 1);
    let mut line = vec![0u8; (end - start) as usize];
    reader.seek(SeekFrom::Start(start))?;
    reader.read_exact(&mut line)?;
    Ok((start, line))
}

/// Position of the last `\n` strictly before `before`, reading backward in
/// fixed-size chunks.
fn find_last_newline(file: &File, before: u64) -> io::Result<Option<u64>> {
    let mut reader = file;
    let mut buf = vec![0u8; CHUNK as usize];
    let mut pos = before;
    while pos > 0 {
        let chunk_start = pos.saturating_sub(CHUNK);
        let n = (pos - chunk_start) as usize;
        reader.seek(SeekFrom::Start(chunk_start))?;
        reader.read_exact(&mut buf[..n])?;
        if let Some(i) = buf[..n].iter().rposition(|&b| b == b'\n') {
            return Ok(Some(chunk_start + i as u64));
        }
        pos = chunk_start;
    }
    Ok(None)
}

/// Forward scan: the last complete line that parses wins.
fn scan_for_tail(file: &File) -> io::Result<TailProbe> {
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(0))?;

    let mut hash = None;
    let mut skipped = 0usize;
    let mut line = Vec::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() != Some(&b'\n') {
            // Unterminated fragment at EOF.
            skipped += 1;
            break;
        }
        line_no += 1;
        match LedgerRecord::from_line(&line[..line.len() - 1]) {
            Ok(record) => hash = Some(record.vault_self_hash),
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping unreadable ledger line");
                skipped += 1;
            }
        }
    }

    debug!(lines = line_no, skipped, found = hash.is_some(), "fallback tail scan complete");
    Ok(TailProbe::Recovered { hash, skipped })
}
