//! # API Route Modules
//!
//! - `animals`: registration, lookup, lost flag, ownership transfer and
//!   per-animal transfer approvals.
//! - `records`: medical records, history, death reports.
//! - `vets`: owner-issued vet authorizations and license binding.
//! - `operators`: account-wide transfer operators.
//! - `licenses`: the in-process license directory.
//! - `directory`: handle → account mapping.

pub mod animals;
pub mod directory;
pub mod licenses;
pub mod operators;
pub mod records;
pub mod vets;
