use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The closed set of asset classes the vault issues identifiers for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Feature,
    Epic,
    Build,
    Service,
    Artifact,
}

impl AssetType {
    /// Every variant, in declaration order.
    pub const ALL: [AssetType; 5] = [
        Self::Feature,
        Self::Epic,
        Self::Build,
        Self::Service,
        Self::Artifact,
    ];

    /// Canonical uppercase label, as it appears in identifiers and records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "FEATURE",
            Self::Epic => "EPIC",
            Self::Build => "BUILD",
            Self::Service => "SERVICE",
            Self::Artifact => "ARTIFACT",
        }
    }
}

impl FromStr for AssetType {
    type Err = ValidationError;

    /// Parse a label, ignoring surrounding whitespace and case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownAssetType(s.to_string()))
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
