//! # Medical Records
//!
//! Immutable entries of the record log and their type taxonomy.

use serde::{Deserialize, Serialize};

use petid_core::{AccountId, AnimalId, ContentRef, Timestamp};

/// Kind of medical event.
///
/// Only `Vaccine` carries a meaningful `days_valid`; only `Deceased`
/// terminates the animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    /// Routine examination or note.
    General,
    /// Vaccination; refreshes the vaccine expiry window.
    Vaccine,
    /// Surgical procedure.
    Surgery,
    /// Radiograph.
    Xray,
    /// Death of the animal (terminal).
    Deceased,
}

impl RecordType {
    /// All record types, in declaration order.
    pub const ALL: [RecordType; 5] = [
        Self::General,
        Self::Vaccine,
        Self::Surgery,
        Self::Xray,
        Self::Deceased,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Vaccine => "VACCINE",
            Self::Surgery => "SURGERY",
            Self::Xray => "XRAY",
            Self::Deceased => "DECEASED",
        }
    }

    /// Whether appending this record ends the animal's life cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deceased)
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown record type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record type {0:?}")]
pub struct UnknownRecordType(pub String);

impl std::str::FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRecordType(s.to_string()))
    }
}

/// One immutable medical event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRecord {
    /// Position in the animal's history (0 = oldest).
    pub sequence: u64,
    /// When the record was appended.
    pub timestamp: Timestamp,
    /// The animal the record belongs to.
    pub animal_id: AnimalId,
    /// The veterinarian who wrote it.
    pub vet: AccountId,
    /// Kind of event.
    pub record_type: RecordType,
    /// Opaque reference to the long-form description in the blob store.
    pub description: ContentRef,
    /// Validity window in days. Only meaningful for `Vaccine`.
    pub days_valid: u32,
}

impl MedicalRecord {
    /// Handle identifying this record.
    pub fn handle(&self) -> RecordHandle {
        RecordHandle {
            animal_id: self.animal_id.clone(),
            sequence: self.sequence,
        }
    }
}

/// Stable reference to an appended record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle {
    /// Animal whose history holds the record.
    pub animal_id: AnimalId,
    /// Position in that history.
    pub sequence: u64,
}

impl std::fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.animal_id, self.sequence)
    }
}
