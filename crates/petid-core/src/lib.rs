//! # petid-core — Foundational Types for the Pet Identity Registry
//!
//! Leaf crate of the workspace. Every other `petid-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `AnimalId`, `AccountId`,
//!    `LicenseId`, `ContentRef` all have validated constructors and
//!    re-validate on deserialization. You cannot pass a license id where an
//!    account is expected.
//!
//! 2. **UTC-only timestamps.** `Timestamp` is seconds-precision UTC. All
//!    day arithmetic (vaccine windows, minimum transfer age) goes through it.
//!
//! 3. **Injected time.** Nothing in the ledger reads the wall clock directly;
//!    it asks a [`Clock`]. Tests and the CLI substitute a [`ManualClock`] or
//!    [`FixedClock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `petid-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod identity;
pub mod temporal;

pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::ValidationError;
pub use identity::{AccountId, AnimalId, ContentRef, LicenseId, HANDLE_MARKER};
pub use temporal::{Timestamp, SECONDS_PER_DAY};
