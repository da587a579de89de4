use tracing::{debug, info};
use vault_ledger::{
    ChainVerifier, Checkpoint, FileLedger, LedgerReader, LedgerRecord, LedgerWriter,
    VerificationResult,
};
use vault_types::{ChainHash, LedgerTimestamp};

use crate::config::VaultConfig;
use crate::error::SdkResult;
use crate::generator::IdentifierGenerator;
use crate::receipt::Receipt;

/// Issues identifiers and records each one on the ledger.
///
/// Safe to share across threads: the ledger serializes appends, so
/// concurrent issuances always extend a single linear chain.
pub struct IssuanceService<L> {
    ledger: L,
}

impl IssuanceService<FileLedger> {
    /// Open the file ledger named by `config`.
    pub fn open(config: &VaultConfig) -> SdkResult<Self> {
        let ledger = FileLedger::open(&config.ledger_path, config.sync_mode)?;
        Ok(Self::new(ledger))
    }
}

impl<L: LedgerWriter + LedgerReader> IssuanceService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Issue a new identifier.
    ///
    /// Validation happens before the ledger is touched, and a failed append
    /// leaves nothing behind, so either a receipt comes back or no record
    /// was written.
    pub fn issue(
        &self,
        asset_type: &str,
        project_id: &str,
        source_reference: &str,
        parent_asset_id: Option<&str>,
    ) -> SdkResult<Receipt> {
        let built = IdentifierGenerator::build(
            asset_type,
            project_id,
            source_reference,
            parent_asset_id,
            LedgerTimestamp::now(),
        )?;
        let record = self.ledger.append(built.into_draft())?;

        info!(
            asset_id = %record.asset_id,
            audit_hash = %record.audit_hash.short_hex(),
            "issued identifier"
        );
        Ok(Receipt::from(&record))
    }

    /// Verify the chain from `from_index` to the end.
    pub fn verify(&self, from_index: usize) -> SdkResult<VerificationResult> {
        debug!(from_index, "verifying ledger");
        Ok(ChainVerifier::verify(&self.ledger, from_index)?)
    }

    pub fn verify_from_checkpoint(&self, checkpoint: Checkpoint) -> SdkResult<VerificationResult> {
        debug!(%checkpoint, "verifying ledger from checkpoint");
        Ok(ChainVerifier::verify_from_checkpoint(&self.ledger, checkpoint)?)
    }

    /// Find a record by asset id or audit hash.
    pub fn lookup(&self, key: &str) -> SdkResult<Option<LedgerRecord>> {
        Ok(ChainVerifier::lookup(&self.ledger, key)?)
    }

    pub fn lineage(&self, asset_id: &str) -> SdkResult<Vec<LedgerRecord>> {
        Ok(ChainVerifier::lineage(&self.ledger, asset_id)?)
    }

    /// Self hash of the newest record.
    pub fn tail_hash(&self) -> SdkResult<ChainHash> {
        Ok(self.ledger.read_tail_hash()?)
    }

    pub fn len(&self) -> SdkResult<usize> {
        Ok(self.ledger.len()?)
    }

    pub fn is_empty(&self) -> SdkResult<bool> {
        Ok(self.ledger.is_empty()?)
    }
}
