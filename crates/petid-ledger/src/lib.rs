//! # petid-ledger — Identity, Ownership and Authorization Ledger
//!
//! The core of the pet identity system. Decides who may register an animal,
//! who may write to its medical history, and when ownership may change
//! hands.
//!
//! ## Modules
//!
//! - **Ledger** (`ledger.rs`): [`IdentityLedger`], the single writer of all
//!   ledger tables and of the record log. Every operation is all-or-nothing.
//!
//! - **Grants** (`grants.rs`): epoch-scoped grant tables. A grant is live
//!   only while the animal's ownership epoch equals the epoch it was issued
//!   at, so a transfer revokes every outstanding grant without a sweep.
//!
//! - **Directory** (`directory.rs`): the [`LicenseOracle`] port. License
//!   validity is re-resolved on every privileged call and never cached.
//!   Directory failures are fail-closed.
//!
//! - **License** (`license.rs`): [`LicenseRegistry`], an in-memory license
//!   directory with an `Active ⇄ Suspended → Revoked | Expired` lifecycle.
//!
//! - **Config** (`config.rs`): [`LedgerConfig`] business constants, loaded
//!   from YAML.
//!
//! ## Crate Policy
//!
//! - Depends only on `petid-core` and `petid-records` internally.
//! - No I/O other than config loading. Time comes from an injected
//!   [`Clock`](petid_core::Clock).

pub mod animal;
pub mod config;
pub mod directory;
pub mod error;
pub mod grants;
pub mod ledger;
pub mod license;

pub use animal::{AnimalIdentity, AnimalState};
pub use config::{ConfigError, LedgerConfig, DEFAULT_MIN_TRANSFER_AGE_DAYS};
pub use directory::{DirectoryError, LicenseOracle};
pub use error::{ErrorCategory, LedgerError, LicenseRejection};
pub use grants::EpochGrants;
pub use ledger::{IdentityLedger, LedgerSnapshot};
pub use license::{License, LicenseError, LicenseRegistry, LicenseState, LicenseTransitionRecord};
