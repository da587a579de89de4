//! Hashing primitives for the asset vault.
//!
//! Provides the canonical JSON form records are hashed over, the BLAKE3
//! chain-hash and audit-hash computations, and a pure link verifier for
//! sequences of chained records.
//!
//! All hashing wraps the `blake3` crate; nothing here touches storage.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::canonical_json;
pub use chain::{ChainError, ChainLinked, HashChainVerifier};
pub use hasher::{ContentHasher, HasherError, RecordHasher};
