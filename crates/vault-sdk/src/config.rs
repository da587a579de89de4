use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vault_ledger::SyncMode;

use crate::error::{SdkError, SdkResult};

/// Where the ledger lives and how hard appends push to disk.
///
/// ```toml
/// ledger_path = "/var/lib/vault/ledger.jsonl"
/// sync_mode = "every_write"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    pub ledger_path: PathBuf,
    pub sync_mode: SyncMode,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("vault-ledger.jsonl"),
            sync_mode: SyncMode::EveryWrite,
        }
    }
}

impl VaultConfig {
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
