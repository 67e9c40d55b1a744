//! # Ledger Errors
//!
//! Every rejection is a typed, synchronous outcome. Three families:
//! authorization, state precondition and transfer gate. A fourth,
//! `Integrity`, covers snapshots that violate the ledger's own invariants
//! and is never produced by a well-formed operation.

use thiserror::Error;

use petid_core::{AccountId, AnimalId, LicenseId, Timestamp};
use petid_records::RecordError;

/// Why a vet failed the license check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseRejection {
    /// The vet has never linked a license.
    Unlinked,
    /// The linked license now belongs to someone else.
    NotHolder,
    /// The directory reports the license invalid.
    Invalid,
    /// The directory could not answer.
    DirectoryUnavailable,
}

impl std::fmt::Display for LicenseRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unlinked => "no license linked",
            Self::NotHolder => "linked license is held by another account",
            Self::Invalid => "linked license is not valid",
            Self::DirectoryUnavailable => "license directory unavailable",
        })
    }
}

/// Failure family, for callers that map errors onto coarser outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller lacks the right to perform the operation.
    Authorization,
    /// The animal is in the wrong lifecycle state.
    StatePrecondition,
    /// A business rule blocks the transfer.
    TransferGate,
    /// Persisted state is inconsistent.
    Integrity,
}

/// Errors returned by [`IdentityLedger`](crate::IdentityLedger) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // ── Authorization ────────────────────────────────────────────────
    /// The vet does not hold a currently valid, self-owned license.
    #[error("vet {vet} is not licensed: {reason}")]
    NotLicensed {
        /// Calling vet.
        vet: AccountId,
        /// Which part of the check failed.
        reason: LicenseRejection,
    },

    /// The caller is not the animal's owner.
    #[error("{caller} is not the owner of animal {animal_id}")]
    NotOwner {
        /// Calling account.
        caller: AccountId,
        /// Target animal.
        animal_id: AnimalId,
    },

    /// The caller may not move the animal on the owner's behalf.
    #[error("{caller} is not authorized to transfer animal {animal_id}")]
    NotAuthorized {
        /// Calling account.
        caller: AccountId,
        /// Target animal.
        animal_id: AnimalId,
    },

    /// No live owner grant exists for this vet and animal.
    #[error("vet {vet} has no live authorization for animal {animal_id}")]
    AuthorizationExpiredOrMissing {
        /// Calling vet.
        vet: AccountId,
        /// Target animal.
        animal_id: AnimalId,
    },

    /// The directory names a different holder for the license.
    #[error("{vet} does not hold license {license_id}")]
    NotLicenseOwner {
        /// Calling vet.
        vet: AccountId,
        /// License being linked.
        license_id: LicenseId,
    },

    /// The license is not currently valid.
    #[error("license {0} is not valid")]
    LicenseInvalid(LicenseId),

    // ── State preconditions ──────────────────────────────────────────
    /// The animal is not registered.
    #[error("animal {0} is not registered")]
    AnimalNotActive(AnimalId),

    /// The animal id is already taken.
    #[error("animal {0} is already registered")]
    AlreadyRegistered(AnimalId),

    /// The animal is deceased and frozen.
    #[error("animal {0} is deceased")]
    AnimalDeceased(AnimalId),

    // ── Transfer gates ───────────────────────────────────────────────
    /// No current vaccination.
    #[error("animal {0} has no current vaccination")]
    VaccinationExpired(AnimalId),

    /// The animal is flagged lost.
    #[error("animal {0} is reported lost")]
    ReportedLost(AnimalId),

    /// The animal is younger than the minimum transfer age.
    #[error("animal {animal_id} may not be transferred before {eligible_at}")]
    BelowMinimumAge {
        /// Target animal.
        animal_id: AnimalId,
        /// Earliest instant a transfer is allowed.
        eligible_at: Timestamp,
    },

    // ── Integrity ────────────────────────────────────────────────────
    /// The record log rejected a write the ledger had already validated.
    #[error("record log: {0}")]
    Records(#[from] RecordError),

    /// Ledger state violates an invariant.
    #[error("ledger integrity violation: {0}")]
    Integrity(String),
}

impl LedgerError {
    /// The failure family.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotLicensed { .. }
            | Self::NotOwner { .. }
            | Self::NotAuthorized { .. }
            | Self::AuthorizationExpiredOrMissing { .. }
            | Self::NotLicenseOwner { .. }
            | Self::LicenseInvalid(_) => ErrorCategory::Authorization,
            Self::AnimalNotActive(_) | Self::AlreadyRegistered(_) | Self::AnimalDeceased(_) => {
                ErrorCategory::StatePrecondition
            }
            Self::VaccinationExpired(_) | Self::ReportedLost(_) | Self::BelowMinimumAge { .. } => {
                ErrorCategory::TransferGate
            }
            Self::Records(_) | Self::Integrity(_) => ErrorCategory::Integrity,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotLicensed { .. } => "NOT_LICENSED",
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::AuthorizationExpiredOrMissing { .. } => "AUTHORIZATION_EXPIRED_OR_MISSING",
            Self::NotLicenseOwner { .. } => "NOT_LICENSE_OWNER",
            Self::LicenseInvalid(_) => "LICENSE_INVALID",
            Self::AnimalNotActive(_) => "ANIMAL_NOT_ACTIVE",
            Self::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            Self::AnimalDeceased(_) => "ANIMAL_DECEASED",
            Self::VaccinationExpired(_) => "VACCINATION_EXPIRED",
            Self::ReportedLost(_) => "REPORTED_LOST",
            Self::BelowMinimumAge { .. } => "BELOW_MINIMUM_AGE",
            Self::Records(_) | Self::Integrity(_) => "LEDGER_INTEGRITY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal() -> AnimalId {
        AnimalId::new("chip-1").unwrap()
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            LedgerError::LicenseInvalid(LicenseId::new("L1").unwrap()).category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            LedgerError::AnimalDeceased(animal()).category(),
            ErrorCategory::StatePrecondition
        );
        assert_eq!(
            LedgerError::ReportedLost(animal()).category(),
            ErrorCategory::TransferGate
        );
        assert_eq!(
            LedgerError::Records(RecordError::UnknownAnimal(animal())).category(),
            ErrorCategory::Integrity
        );
    }

    #[test]
    fn test_codes_are_screaming_snake() {
        let errors = [
            LedgerError::VaccinationExpired(animal()),
            LedgerError::AuthorizationExpiredOrMissing {
                vet: AccountId::new("v").unwrap(),
                animal_id: animal(),
            },
            LedgerError::Integrity("x".into()),
        ];
        for e in errors {
            assert!(e
                .code()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_not_licensed_message_carries_reason() {
        let e = LedgerError::NotLicensed {
            vet: AccountId::new("vet-1").unwrap(),
            reason: LicenseRejection::Unlinked,
        };
        assert_eq!(e.to_string(), "vet vet-1 is not licensed: no license linked");
    }
}
