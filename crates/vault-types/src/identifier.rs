use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::asset::AssetType;
use crate::error::TypeError;

/// Random token embedded in every identifier.
///
/// Eight bytes rendered as sixteen uppercase hex digits in four
/// dash-separated groups, e.g. `A1B2-C3D4-E5F6-0789`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entropy([u8; 8]);

impl Entropy {
    pub const BYTES: usize = 8;
    const RENDERED_LEN: usize = 19;

    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.0.chunks(2).enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{:02X}{:02X}", pair[0], pair[1])?;
        }
        Ok(())
    }
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entropy({self})")
    }
}

impl FromStr for Entropy {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::RENDERED_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::RENDERED_LEN,
                actual: s.len(),
            });
        }
        let groups: Vec<&str> = s.split('-').collect();
        let well_formed = groups.len() == 4
            && groups.iter().all(|g| {
                g.len() == 4 && g.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'))
            });
        if !well_formed {
            return Err(TypeError::InvalidHex(format!(
                "{s:?} is not four dash-separated groups of uppercase hex"
            )));
        }
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(groups.concat(), &mut bytes)
            .map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Three-character readability checksum over an identifier's logical fields.
///
/// Not collision resistant and never an integrity signal; only the hash
/// chain protects the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Glyph([u8; 3]);

impl Glyph {
    /// 32 symbols with the lookalikes `I`, `O`, `0` and `1` removed.
    pub const ALPHABET: &'static [u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    pub const LEN: usize = 3;

    /// Derive the glyph for a `TYPE|PROJECT|SOURCE` seed.
    ///
    /// Order sensitive: the running sum is multiplied before each byte is
    /// added, so permuting the seed changes the result.
    pub fn from_seed(seed: &str) -> Self {
        let base = Self::ALPHABET.len() as u64;
        let mut sum = seed
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));

        let mut out = [0u8; 3];
        for slot in &mut out {
            let idx = sum % base;
            *slot = Self::ALPHABET[idx as usize];
            sum = (sum / base).wrapping_mul(31).wrapping_add(idx);
        }
        Self(out)
    }

    /// Glyph for the logical fields of an identifier.
    pub fn derive(asset_type: AssetType, project_id: &str, source_reference: &str) -> Self {
        Self::from_seed(&glyph_seed(asset_type, project_id, source_reference))
    }

    pub fn as_str(&self) -> &str {
        // ALPHABET is pure ASCII, so any 3 of its bytes are valid UTF-8.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Glyph({})", self.as_str())
    }
}

impl FromStr for Glyph {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != Self::LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        if !bytes.iter().all(|b| Self::ALPHABET.contains(b)) {
            return Err(TypeError::InvalidHex(format!(
                "{s:?} contains characters outside the glyph alphabet"
            )));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }
}

/// The `TYPE|PROJECT|SOURCE` string both the glyph and audit hash start from.
pub fn glyph_seed(asset_type: AssetType, project_id: &str, source_reference: &str) -> String {
    format!(
        "{}|{}|{}",
        asset_type.as_str(),
        project_id.to_uppercase(),
        source_reference.to_uppercase()
    )
}

/// A human-facing asset identifier: `TYPE-PROJECT-SOURCE-ENTROPY-GLYPH`.
///
/// The project and source segments are stored uppercased. Since both may
/// themselves contain dashes, the rendered string is not parsed back into
/// parts; records keep every part as a separate field instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetIdentifier {
    pub asset_type: AssetType,
    pub project_id: String,
    pub source_reference: String,
    pub entropy: String,
    pub glyph: String,
}

impl AssetIdentifier {
    pub fn new(
        asset_type: AssetType,
        project_id: &str,
        source_reference: &str,
        entropy: Entropy,
        glyph: Glyph,
    ) -> Self {
        Self {
            asset_type,
            project_id: project_id.to_uppercase(),
            source_reference: source_reference.to_uppercase(),
            entropy: entropy.to_string(),
            glyph: glyph.to_string(),
        }
    }

    /// The dash-joined rendering stored as `asset_id`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.asset_type, self.project_id, self.source_reference, self.entropy, self.glyph
        )
    }
}
