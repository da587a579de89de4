//! High-level API for the asset vault.
//!
//! [`IssuanceService`] is the surface collaborators consume: it validates
//! and builds identifiers with [`IdentifierGenerator`], records each
//! issuance on a hash-chained ledger, and exposes verification, lookup, and
//! lineage queries over that ledger.

pub mod config;
pub mod error;
pub mod generator;
pub mod receipt;
pub mod service;

pub use config::VaultConfig;
pub use error::{SdkError, SdkResult};
pub use generator::{BuiltIdentifier, IdentifierGenerator};
pub use receipt::Receipt;
pub use service::IssuanceService;
