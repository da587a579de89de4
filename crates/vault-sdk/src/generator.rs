use rand::rngs::OsRng;
use rand::RngCore;
use vault_crypto::ContentHasher;
use vault_ledger::RecordDraft;
use vault_types::identifier::glyph_seed;
use vault_types::{
    AssetIdentifier, AssetType, ChainHash, Entropy, Glyph, LedgerTimestamp, ValidationError,
};

/// A validated, fully rendered identifier ready to be recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltIdentifier {
    pub identifier: AssetIdentifier,
    pub asset_id: String,
    pub audit_hash: ChainHash,
    pub timestamp: LedgerTimestamp,
    pub parent_asset_id: Option<String>,
}

impl BuiltIdentifier {
    /// The ledger record this identifier becomes, minus its chain fields.
    pub fn into_draft(self) -> RecordDraft {
        RecordDraft {
            asset_id: self.asset_id,
            asset_type: self.identifier.asset_type,
            project_id: self.identifier.project_id,
            source_reference: self.identifier.source_reference,
            parent_asset_id: self.parent_asset_id,
            timestamp: self.timestamp,
            audit_hash: self.audit_hash,
            entropy: self.identifier.entropy,
            glyph: self.identifier.glyph,
        }
    }
}

/// Builds human-facing identifiers and their readability glyphs.
pub struct IdentifierGenerator;

impl IdentifierGenerator {
    /// Fresh entropy from the operating system's CSPRNG.
    pub fn generate_entropy() -> Entropy {
        let mut bytes = [0u8; Entropy::BYTES];
        OsRng.fill_bytes(&mut bytes);
        Entropy::from_bytes(bytes)
    }

    pub fn generate_glyph(seed: &str) -> Glyph {
        Glyph::from_seed(seed)
    }

    /// Recompute the glyph for the given fields and compare.
    ///
    /// A match only means the identifier was probably transcribed correctly;
    /// it says nothing about ledger integrity.
    pub fn verify_glyph(
        asset_type: AssetType,
        project_id: &str,
        source_reference: &str,
        glyph: &str,
    ) -> bool {
        Glyph::derive(asset_type, project_id, source_reference).as_str() == glyph
    }

    /// Validate and normalize the inputs, then render the identifier and
    /// its audit hash for an issuance at `issued_at`.
    pub fn build(
        asset_type: &str,
        project_id: &str,
        source_reference: &str,
        parent_asset_id: Option<&str>,
        issued_at: LedgerTimestamp,
    ) -> Result<BuiltIdentifier, ValidationError> {
        let asset_type: AssetType = asset_type.parse()?;
        let project_id = non_empty("project_id", project_id)?;
        let source_reference = non_empty("source_reference", source_reference)?;
        let parent_asset_id = parent_asset_id
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let glyph = Self::generate_glyph(&glyph_seed(asset_type, project_id, source_reference));
        let identifier = AssetIdentifier::new(
            asset_type,
            project_id,
            source_reference,
            Self::generate_entropy(),
            glyph,
        );
        let asset_id = identifier.render();
        let timestamp = issued_at.to_string();

        let audit_hash = ContentHasher::hash_fields(&[
            asset_id.as_str(),
            timestamp.as_str(),
            identifier.asset_type.as_str(),
            identifier.project_id.as_str(),
            identifier.source_reference.as_str(),
            parent_asset_id.as_deref().unwrap_or(""),
        ]);

        Ok(BuiltIdentifier {
            identifier,
            asset_id,
            audit_hash,
            timestamp: issued_at,
            parent_asset_id,
        })
    }
}

fn non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed)
}
