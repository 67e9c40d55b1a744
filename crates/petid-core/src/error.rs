//! # Validation Errors
//!
//! Errors raised when an identifier or timestamp fails its constructor
//! checks. Ledger and record errors live in their own crates.

use thiserror::Error;

/// A value failed domain validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required identifier was empty after trimming.
    #[error("{kind} must not be empty")]
    Empty {
        /// Identifier kind (e.g. "animal id").
        kind: &'static str,
    },

    /// Identifier exceeds its maximum length.
    #[error("{kind} exceeds {max} characters (got {len})")]
    TooLong {
        /// Identifier kind.
        kind: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual length.
        len: usize,
    },

    /// Identifier contains a character outside its allowed alphabet.
    #[error("{kind} contains invalid character {ch:?}")]
    InvalidCharacter {
        /// Identifier kind.
        kind: &'static str,
        /// Offending character.
        ch: char,
    },

    /// Timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}
