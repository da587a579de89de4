use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// A 256-bit hash as it appears in the ledger.
///
/// Always rendered (and only ever accepted) as 64 lowercase hex characters,
/// both in the persisted records and in canonical hashing input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainHash([u8; 32]);

impl ChainHash {
    /// Number of hex characters in the rendered form.
    pub const HEX_LEN: usize = 64;

    /// The genesis sentinel: the "previous hash" of the first record.
    /// Renders as 64 ASCII `'0'` characters.
    pub const GENESIS: Self = Self([0u8; 32]);

    /// Wrap a pre-computed digest.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Returns `true` if this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines and terminal output.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse the strict persisted form: exactly 64 lowercase hex characters.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TypeError::InvalidHex(format!(
                "{s:?} is not lowercase hexadecimal"
            )));
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl FromStr for ChainHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", self.short_hex())
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for ChainHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ChainHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_renders_as_64_zeros() {
        assert_eq!(ChainHash::GENESIS.to_hex(), "0".repeat(64));
        assert!(ChainHash::GENESIS.is_genesis());
    }

    #[test]
    fn hex_roundtrip() {
        let hash = ChainHash::from_hash([0xab; 32]);
        let parsed = ChainHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
        assert!(!parsed.is_genesis());
    }

    #[test]
    fn uppercase_hex_is_rejected() {
        let upper = "AB".repeat(32);
        assert!(matches!(
            ChainHash::from_hex(&upper),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = ChainHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 64,
                actual: 4
            }
        );
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = ChainHash::from_hash([0x01; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let parsed: ChainHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<ChainHash>("\"not-a-hash\"").is_err());
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(ChainHash::from_hash([0xcd; 32]).short_hex(), "cdcdcdcd");
    }
}
