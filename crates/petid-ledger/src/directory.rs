//! # License Directory Port
//!
//! The ledger never caches license validity. Every privileged call resolves
//! it afresh through a [`LicenseOracle`]. Any directory error is treated as
//! "not valid" by the caller (fail-closed).

use thiserror::Error;

use petid_core::{AccountId, LicenseId};

/// Failure reported by a license directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The directory has no such license.
    #[error("license {0} not found in directory")]
    NotFound(LicenseId),

    /// The directory could not be consulted.
    #[error("license directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the external license directory.
pub trait LicenseOracle: Send + Sync {
    /// Whether the license is currently valid.
    fn is_license_valid(&self, license_id: &LicenseId) -> Result<bool, DirectoryError>;

    /// Current holder of the license.
    fn license_owner(&self, license_id: &LicenseId) -> Result<AccountId, DirectoryError>;
}
