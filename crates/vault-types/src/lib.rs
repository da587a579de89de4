//! Foundation types for the asset vault.
//!
//! This crate provides the value types shared by every other vault crate:
//! the asset classification, the human-facing identifier and its parts,
//! the chain hash used to link ledger records, and the fixed-format ledger
//! timestamp.
//!
//! # Key Types
//!
//! - [`AssetType`]: Closed set of issuable asset classes
//! - [`AssetIdentifier`]: `TYPE-PROJECT-SOURCE-ENTROPY-GLYPH` identifier
//! - [`Entropy`] / [`Glyph`]: Random token and readability checksum
//! - [`ChainHash`]: 256-bit hash rendered as 64 lowercase hex characters
//! - [`LedgerTimestamp`]: UTC instant at microsecond precision

pub mod asset;
pub mod error;
pub mod hash;
pub mod identifier;
pub mod temporal;

pub use asset::AssetType;
pub use error::{TypeError, ValidationError};
pub use hash::ChainHash;
pub use identifier::{AssetIdentifier, Entropy, Glyph};
pub use temporal::LedgerTimestamp;
