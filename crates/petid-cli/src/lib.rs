//! # petid-cli — CLI Tool for the Pet Identity Registry
//!
//! Provides the `petid` command-line interface. Every invocation loads the
//! state file, applies one operation as the account named by `--as`, and
//! writes the state back only if the operation succeeded.
//!
//! ## Subcommands
//!
//! - `petid license`: License directory administration.
//! - `petid vet`: License binding and owner-issued vet authorization.
//! - `petid animal`: Registration, lookup, lost flag, transfers, operators.
//! - `petid record`: Medical records, death reports, history.
//!
//! ```bash
//! petid license issue --id LIC-1 --holder vet-1
//! petid --as vet-1 vet link --license LIC-1
//! petid --as vet-1 animal register --id 985112000000001 --owner alice
//! petid --as alice vet approve --animal 985112000000001 --vet vet-1
//! ```
//!
//! ## Exit codes
//!
//! `0` success, `1` usage or I/O failure, `2` the ledger or license
//! directory rejected the operation.

pub mod animal;
pub mod license;
pub mod record;
pub mod session;
pub mod vet;

use anyhow::{Context, Result};

use petid_core::{AccountId, AnimalId, Timestamp};
use petid_ledger::{LedgerError, LicenseError};

pub use session::{Session, SessionOptions, StateFile};

/// Default location of the state file, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = ".petid/state.json";

/// Exit code for an operation the ledger refused.
pub const EXIT_REJECTED: u8 = 2;

/// Print a ledger rejection and return [`EXIT_REJECTED`].
pub fn report_rejection(err: &LedgerError) -> u8 {
    eprintln!("REJECTED [{}]: {err}", err.code());
    EXIT_REJECTED
}

/// Print a license directory rejection and return [`EXIT_REJECTED`].
pub fn report_license_rejection(err: &LicenseError) -> u8 {
    eprintln!("REJECTED: {err}");
    EXIT_REJECTED
}

/// Parse an RFC 3339 UTC timestamp argument.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    Timestamp::parse(raw).with_context(|| format!("invalid timestamp {raw:?}"))
}

pub(crate) fn parse_animal(raw: &str) -> Result<AnimalId> {
    AnimalId::new(raw).with_context(|| format!("invalid animal id {raw:?}"))
}

pub(crate) fn parse_account(raw: &str) -> Result<AccountId> {
    AccountId::new(raw).with_context(|| format!("invalid account id {raw:?}"))
}
