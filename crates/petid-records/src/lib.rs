//! # petid-records — Append-Only Medical Record Log
//!
//! The Record Log holds every medical event ever written for an animal.
//! It is the sole owner of two derived facts:
//!
//! - **Vaccine expiry**: overwritten (not accumulated) each time a
//!   `VACCINE` record is appended, as `now + days_valid * 86400`.
//! - **Birth date**: set at most once per animal.
//!
//! ## Storage Shape
//!
//! ```text
//! entries: [r0, r1, r2, r3, ...]        arena, append-only
//! index:   chip-A -> [0, 2]             per-animal positions, oldest first
//!          chip-B -> [1, 3]
//! derived: chip-A -> { vaccine_expires_at, birth_date }
//! ```
//!
//! Authorization is not this crate's concern. The identity ledger decides
//! who may append; the log only requires that the animal stream exists.

pub mod error;
pub mod log;
pub mod record;

pub use error::RecordError;
pub use log::{Appended, DerivedFacts, History, RecordLog};
pub use record::{MedicalRecord, RecordHandle, RecordType, UnknownRecordType};
