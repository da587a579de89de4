use std::collections::HashSet;
use std::fmt;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vault_crypto::{ChainError, HashChainVerifier};
use vault_types::ChainHash;

use crate::error::LedgerError;
use crate::records::{LedgerEntry, LedgerRecord};
use crate::traits::LedgerReader;

/// A resumption point: verification restarts at `index`, expecting that
/// record to link to `prev_hash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub index: usize,
    pub prev_hash: ChainHash,
}

impl Checkpoint {
    /// The start of every chain.
    pub const GENESIS: Self = Self {
        index: 0,
        prev_hash: ChainHash::GENESIS,
    };
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.prev_hash)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// `vault_prev_hash` does not equal the predecessor's self hash.
    PrevHashMismatch,
    /// The stored self hash does not recompute from the record's content.
    SelfHashMismatch,
    /// A complete line that is not a record.
    Unreadable,
}

/// The first broken link found by a verification run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    pub index: usize,
    pub kind: ViolationKind,
    pub expected: Option<ChainHash>,
    pub found: Option<ChainHash>,
    pub detail: String,
}

impl IntegrityViolation {
    fn unreadable(index: usize, reason: String) -> Self {
        Self {
            index,
            kind: ViolationKind::Unreadable,
            expected: None,
            found: None,
            detail: reason,
        }
    }
}

impl From<ChainError> for IntegrityViolation {
    fn from(e: ChainError) -> Self {
        let detail = e.to_string();
        match e {
            ChainError::PrevHashMismatch {
                index,
                expected,
                found,
            } => Self {
                index,
                kind: ViolationKind::PrevHashMismatch,
                expected: Some(expected),
                found: Some(found),
                detail,
            },
            ChainError::SelfHashMismatch {
                index,
                stored,
                computed,
            } => Self {
                index,
                kind: ViolationKind::SelfHashMismatch,
                expected: Some(computed),
                found: Some(stored),
                detail,
            },
            ChainError::Canonicalization { index, .. } => Self::unreadable(index, detail),
        }
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.index, self.detail)
    }
}

/// Outcome of a verification run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// Every record in `[from_index, from_index + checked)` links correctly.
    Verified {
        from_index: usize,
        checked: usize,
        tail_hash: ChainHash,
    },
    Violated(IntegrityViolation),
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn violation(&self) -> Option<&IntegrityViolation> {
        match self {
            Self::Verified { .. } => None,
            Self::Violated(v) => Some(v),
        }
    }

    /// Where a later run can pick up after this one succeeded.
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match self {
            Self::Verified {
                from_index,
                checked,
                tail_hash,
            } => Some(Checkpoint {
                index: from_index + checked,
                prev_hash: *tail_hash,
            }),
            Self::Violated(_) => None,
        }
    }
}

/// Audit-time operations over any ledger reader.
///
/// Every operation is a linear scan. Nothing here modifies the ledger, and
/// a violation is reported, never repaired.
pub struct ChainVerifier;

impl ChainVerifier {
    /// Verify every record from `from_index` to the end.
    ///
    /// For `from_index > 0` the walk is seeded with the stored self hash of
    /// record `from_index - 1`.
    pub fn verify<R: LedgerReader + ?Sized>(
        reader: &R,
        from_index: usize,
    ) -> Result<VerificationResult, LedgerError> {
        let len = reader.len()?;
        if from_index > len {
            return Err(LedgerError::InvalidRange {
                from: from_index,
                len,
            });
        }
        if from_index == 0 {
            return Self::walk(reader, Checkpoint::GENESIS);
        }

        let seed_index = from_index - 1;
        let mut seed = None;
        reader.scan_from(seed_index, &mut |_, entry| {
            seed = Some(entry);
            ControlFlow::Break(())
        })?;
        match seed {
            Some(LedgerEntry::Record(record)) => Self::walk(
                reader,
                Checkpoint {
                    index: from_index,
                    prev_hash: record.vault_self_hash,
                },
            ),
            Some(LedgerEntry::Unreadable { reason }) => Ok(VerificationResult::Violated(
                IntegrityViolation::unreadable(seed_index, reason),
            )),
            // Only reachable if the ledger shrank after `len` was taken.
            None => Err(LedgerError::InvalidRange {
                from: from_index,
                len: seed_index,
            }),
        }
    }

    /// Verify from a caller-supplied checkpoint, typically one returned by
    /// [`VerificationResult::checkpoint`] on an earlier run.
    pub fn verify_from_checkpoint<R: LedgerReader + ?Sized>(
        reader: &R,
        checkpoint: Checkpoint,
    ) -> Result<VerificationResult, LedgerError> {
        let len = reader.len()?;
        if checkpoint.index > len {
            return Err(LedgerError::InvalidRange {
                from: checkpoint.index,
                len,
            });
        }
        Self::walk(reader, checkpoint)
    }

    fn walk<R: LedgerReader + ?Sized>(
        reader: &R,
        start: Checkpoint,
    ) -> Result<VerificationResult, LedgerError> {
        let mut expected_prev = start.prev_hash;
        let mut checked = 0usize;
        let mut violation = None;

        reader.scan_from(start.index, &mut |index, entry| {
            let record = match entry {
                LedgerEntry::Record(record) => record,
                LedgerEntry::Unreadable { reason } => {
                    violation = Some(IntegrityViolation::unreadable(index, reason));
                    return ControlFlow::Break(());
                }
            };
            match HashChainVerifier::verify_link(index, &record, &expected_prev) {
                Ok(()) => {
                    expected_prev = record.vault_self_hash;
                    checked += 1;
                    if checked % 10_000 == 0 {
                        debug!(index, checked, "verification progress");
                    }
                    ControlFlow::Continue(())
                }
                Err(e) => {
                    violation = Some(IntegrityViolation::from(e));
                    ControlFlow::Break(())
                }
            }
        })?;

        match violation {
            Some(v) => {
                warn!(index = v.index, kind = ?v.kind, "ledger integrity violation");
                Ok(VerificationResult::Violated(v))
            }
            None => {
                debug!(
                    from = start.index,
                    checked,
                    tail = %expected_prev.short_hex(),
                    "ledger verified"
                );
                Ok(VerificationResult::Verified {
                    from_index: start.index,
                    checked,
                    tail_hash: expected_prev,
                })
            }
        }
    }

    /// First record whose asset id or audit hash equals `key`.
    pub fn lookup<R: LedgerReader + ?Sized>(
        reader: &R,
        key: &str,
    ) -> Result<Option<LedgerRecord>, LedgerError> {
        Self::find(reader, |r| r.matches_key(key))
    }

    /// The record for `asset_id` followed by each ancestor reached through
    /// `parent_asset_id`. Stops at a parent that is not in the ledger or at a
    /// cycle. Empty if `asset_id` itself is unknown.
    pub fn lineage<R: LedgerReader + ?Sized>(
        reader: &R,
        asset_id: &str,
    ) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut lineage = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(asset_id.to_string());

        while let Some(id) = next.take() {
            if !seen.insert(id.clone()) {
                warn!(asset_id = %id, "parent cycle in ledger lineage");
                break;
            }
            let Some(record) = Self::find(reader, |r| r.asset_id == id)? else {
                if !lineage.is_empty() {
                    debug!(asset_id = %id, "lineage parent not in ledger");
                }
                break;
            };
            next = record.parent_asset_id.clone();
            lineage.push(record);
        }
        Ok(lineage)
    }

    fn find<R: LedgerReader + ?Sized>(
        reader: &R,
        pred: impl Fn(&LedgerRecord) -> bool,
    ) -> Result<Option<LedgerRecord>, LedgerError> {
        let mut found = None;
        reader.scan_from(0, &mut |_, entry| match entry {
            LedgerEntry::Record(record) if pred(&record) => {
                found = Some(record);
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        })?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vault_types::{AssetType, LedgerTimestamp};

    use crate::file::{FileLedger, SyncMode};
    use crate::memory::InMemoryLedger;
    use crate::records::tests::draft;
    use crate::records::RecordDraft;
    use crate::traits::LedgerWriter;

    fn filled(n: u32) -> (InMemoryLedger, Vec<LedgerRecord>) {
        let ledger = InMemoryLedger::new();
        let records = (0..n).map(|i| ledger.append(draft(i)).unwrap()).collect();
        (ledger, records)
    }

    fn named(asset_id: &str, parent: Option<&str>) -> RecordDraft {
        let mut d = draft(0);
        d.asset_id = asset_id.into();
        d.parent_asset_id = parent.map(str::to_string);
        d
    }

    #[test]
    fn empty_ledger_verifies() {
        let ledger = InMemoryLedger::new();
        assert_eq!(
            ChainVerifier::verify(&ledger, 0).unwrap(),
            VerificationResult::Verified {
                from_index: 0,
                checked: 0,
                tail_hash: ChainHash::GENESIS,
            }
        );
    }

    #[test]
    fn full_verify_reports_last_self_hash() {
        for n in 1..6 {
            let (ledger, records) = filled(n);
            let result = ChainVerifier::verify(&ledger, 0).unwrap();
            assert_eq!(
                result,
                VerificationResult::Verified {
                    from_index: 0,
                    checked: n as usize,
                    tail_hash: records.last().unwrap().vault_self_hash,
                }
            );
        }
    }

    #[test]
    fn suffix_verify_seeds_from_predecessor() {
        let (ledger, records) = filled(5);
        let result = ChainVerifier::verify(&ledger, 3).unwrap();
        assert_eq!(
            result,
            VerificationResult::Verified {
                from_index: 3,
                checked: 2,
                tail_hash: records[4].vault_self_hash,
            }
        );
    }

    #[test]
    fn verify_at_len_is_trivially_verified() {
        let (ledger, records) = filled(3);
        assert_eq!(
            ChainVerifier::verify(&ledger, 3).unwrap(),
            VerificationResult::Verified {
                from_index: 3,
                checked: 0,
                tail_hash: records[2].vault_self_hash,
            }
        );
    }

    #[test]
    fn verify_past_end_is_invalid_range() {
        let (ledger, _) = filled(2);
        assert!(matches!(
            ChainVerifier::verify(&ledger, 3),
            Err(LedgerError::InvalidRange { from: 3, len: 2 })
        ));
        assert!(matches!(
            ChainVerifier::verify_from_checkpoint(
                &ledger,
                Checkpoint {
                    index: 9,
                    prev_hash: ChainHash::GENESIS
                }
            ),
            Err(LedgerError::InvalidRange { from: 9, len: 2 })
        ));
    }

    #[test]
    fn checkpoint_resumes_after_more_appends() {
        let (ledger, _) = filled(3);
        let first = ChainVerifier::verify(&ledger, 0).unwrap();
        let checkpoint = first.checkpoint().unwrap();
        assert_eq!(checkpoint.index, 3);

        let d = ledger.append(draft(10)).unwrap();
        let e = ledger.append(draft(11)).unwrap();
        assert_eq!(d.vault_prev_hash, checkpoint.prev_hash);

        let resumed = ChainVerifier::verify_from_checkpoint(&ledger, checkpoint).unwrap();
        assert_eq!(
            resumed,
            VerificationResult::Verified {
                from_index: 3,
                checked: 2,
                tail_hash: e.vault_self_hash,
            }
        );
    }

    #[test]
    fn wrong_checkpoint_hash_is_a_prev_mismatch() {
        let (ledger, records) = filled(3);
        let bogus = ChainHash::from_hash([0xee; 32]);
        let result = ChainVerifier::verify_from_checkpoint(
            &ledger,
            Checkpoint {
                index: 1,
                prev_hash: bogus,
            },
        )
        .unwrap();
        let violation = result.violation().unwrap();
        assert_eq!(violation.index, 1);
        assert_eq!(violation.kind, ViolationKind::PrevHashMismatch);
        assert_eq!(violation.expected, Some(bogus));
        assert_eq!(violation.found, Some(records[0].vault_self_hash));
        assert!(result.checkpoint().is_none());
    }

    #[test]
    fn content_tamper_is_a_self_hash_mismatch() {
        let (ledger, records) = filled(4);
        ledger.tamper(2, |r| r.project_id = "EVIL".into());
        let result = ChainVerifier::verify(&ledger, 0).unwrap();
        let violation = result.violation().unwrap();
        assert_eq!(violation.index, 2);
        assert_eq!(violation.kind, ViolationKind::SelfHashMismatch);
        assert_eq!(violation.found, Some(records[2].vault_self_hash));
    }

    #[test]
    fn relinked_record_is_a_prev_mismatch() {
        let (ledger, _) = filled(4);
        // Re-hash record 2 onto a forged predecessor; its own hash is
        // self-consistent, so only the link exposes it.
        ledger.tamper(2, |r| {
            r.vault_prev_hash = ChainHash::from_hash([3; 32]);
            r.vault_self_hash = r.recompute_self_hash().unwrap();
        });
        let violation = ChainVerifier::verify(&ledger, 0)
            .unwrap()
            .violation()
            .cloned()
            .unwrap();
        assert_eq!(violation.index, 2);
        assert_eq!(violation.kind, ViolationKind::PrevHashMismatch);
    }

    #[test]
    fn verify_never_repairs() {
        let (ledger, _) = filled(2);
        ledger.tamper(0, |r| r.glyph = "ZZZ".into());
        let before = ledger.read_all().unwrap();
        assert!(!ChainVerifier::verify(&ledger, 0).unwrap().is_verified());
        assert_eq!(ledger.read_all().unwrap(), before);
    }

    #[test]
    fn unreadable_line_in_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = FileLedger::open(&path, SyncMode::OsDefault).unwrap();
        ledger.append(draft(1)).unwrap();
        ledger.append(draft(2)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines[1] = "{\"asset_id\": 42}";
        std::fs::write(&path, format!("{}\n", lines.join("\n"))).unwrap();

        let violation = ChainVerifier::verify(&ledger, 0)
            .unwrap()
            .violation()
            .cloned()
            .unwrap();
        assert_eq!(violation.index, 1);
        assert_eq!(violation.kind, ViolationKind::Unreadable);

        // Seeding a suffix run from the unreadable record reports it too.
        let seeded = ChainVerifier::verify(&ledger, 2).unwrap();
        assert_eq!(seeded.violation().map(|v| v.index), Some(1));
    }

    #[test]
    fn edited_file_line_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = FileLedger::open(&path, SyncMode::OsDefault).unwrap();
        for i in 0..3 {
            ledger.append(draft(i)).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replacen("\"V1\"", "\"V9\"", 1)).unwrap();

        let violation = ChainVerifier::verify(&ledger, 0)
            .unwrap()
            .violation()
            .cloned()
            .unwrap();
        assert_eq!(violation.index, 1);
        assert_eq!(violation.kind, ViolationKind::SelfHashMismatch);
    }

    #[test]
    fn lookup_by_asset_id_or_audit_hash() {
        let (ledger, records) = filled(3);
        let target = &records[1];
        assert_eq!(
            ChainVerifier::lookup(&ledger, &target.asset_id).unwrap().as_ref(),
            Some(target)
        );
        assert_eq!(
            ChainVerifier::lookup(&ledger, &target.audit_hash.to_hex())
                .unwrap()
                .as_ref(),
            Some(target)
        );
        assert!(ChainVerifier::lookup(&ledger, "NOPE").unwrap().is_none());
    }

    #[test]
    fn lookup_returns_first_match() {
        let ledger = InMemoryLedger::new();
        let first = ledger.append(named("DUP", None)).unwrap();
        ledger.append(named("DUP", None)).unwrap();
        assert_eq!(ChainVerifier::lookup(&ledger, "DUP").unwrap(), Some(first));
    }

    #[test]
    fn lineage_follows_parents() {
        let ledger = InMemoryLedger::new();
        ledger.append(named("A", None)).unwrap();
        ledger.append(named("B", Some("A"))).unwrap();
        ledger.append(named("C", Some("B"))).unwrap();
        let ids: Vec<_> = ChainVerifier::lineage(&ledger, "C")
            .unwrap()
            .into_iter()
            .map(|r| r.asset_id)
            .collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
    }

    #[test]
    fn lineage_stops_at_missing_parent_and_cycles() {
        let ledger = InMemoryLedger::new();
        ledger.append(named("ORPHAN", Some("GONE"))).unwrap();
        ledger.append(named("X", Some("Y"))).unwrap();
        ledger.append(named("Y", Some("X"))).unwrap();

        assert_eq!(ChainVerifier::lineage(&ledger, "ORPHAN").unwrap().len(), 1);
        let ids: Vec<_> = ChainVerifier::lineage(&ledger, "X")
            .unwrap()
            .into_iter()
            .map(|r| r.asset_id)
            .collect();
        assert_eq!(ids, vec!["X", "Y"]);
        assert!(ChainVerifier::lineage(&ledger, "UNKNOWN").unwrap().is_empty());
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let (ledger, _) = filled(1);
        let json = serde_json::to_value(ChainVerifier::verify(&ledger, 0).unwrap()).unwrap();
        assert_eq!(json["status"], "verified");
        assert_eq!(json["checked"], 1);
    }

    fn tamper_field(record: &mut LedgerRecord, field: u8) {
        fn flip(hash: ChainHash) -> ChainHash {
            let mut bytes = *hash.as_bytes();
            bytes[0] ^= 0x01;
            ChainHash::from_hash(bytes)
        }
        match field {
            0 => record.asset_id.push('X'),
            1 => {
                record.asset_type = if record.asset_type == AssetType::Epic {
                    AssetType::Build
                } else {
                    AssetType::Epic
                }
            }
            2 => record.project_id.push('X'),
            3 => record.source_reference.push('X'),
            4 => {
                record.parent_asset_id = match record.parent_asset_id.take() {
                    Some(_) => None,
                    None => Some("X".into()),
                }
            }
            5 => {
                record.timestamp =
                    LedgerTimestamp::from_unix_micros(record.timestamp.unix_micros() + 1).unwrap()
            }
            6 => record.audit_hash = flip(record.audit_hash),
            7 => record.entropy.push('X'),
            8 => record.glyph.push('X'),
            9 => record.vault_prev_hash = flip(record.vault_prev_hash),
            _ => record.vault_self_hash = flip(record.vault_self_hash),
        }
    }

    proptest! {
        #[test]
        fn any_single_field_tamper_is_detected(
            len in 1u32..8,
            pick in any::<prop::sample::Index>(),
            field in 0u8..11,
        ) {
            let (ledger, _) = filled(len);
            let target = pick.index(len as usize);
            ledger.tamper(target, |r| tamper_field(r, field));

            let result = ChainVerifier::verify(&ledger, 0).unwrap();
            let violation = result.violation();
            prop_assert!(violation.is_some(), "tamper of field {} at {} passed", field, target);
            prop_assert!(violation.unwrap().index <= target);
        }
    }
}
