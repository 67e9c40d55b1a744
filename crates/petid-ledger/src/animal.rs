//! # Animal Identity
//!
//! One row per registered animal. Rows are never deleted; death freezes
//! them in place.

use serde::{Deserialize, Serialize};

use petid_core::{AccountId, AnimalId, ContentRef, Timestamp};

/// Lifecycle state of an animal id.
///
/// `Unregistered → Active → Deceased`, with `Deceased` terminal. The lost
/// flag is orthogonal and lives on [`AnimalIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimalState {
    /// No identity exists under this id.
    Unregistered,
    /// Registered and alive.
    Active,
    /// A terminal record has been appended.
    Deceased,
}

impl AnimalState {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "UNREGISTERED",
            Self::Active => "ACTIVE",
            Self::Deceased => "DECEASED",
        }
    }
}

impl std::fmt::Display for AnimalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalIdentity {
    /// Externally supplied identifier (chip id).
    pub animal_id: AnimalId,
    /// Current owner.
    pub owner: AccountId,
    /// Opaque pointer to externally stored metadata.
    pub metadata_ref: ContentRef,
    /// Set by the owner; blocks transfer while true.
    pub is_lost: bool,
    /// Starts at 1, incremented by every completed transfer.
    pub ownership_epoch: u64,
    /// False once a `DECEASED` record exists.
    pub alive: bool,
    /// When the animal was registered.
    pub registered_at: Timestamp,
    /// The vet who registered it.
    pub registered_by: AccountId,
}

impl AnimalIdentity {
    /// Epoch assigned at registration.
    pub const INITIAL_EPOCH: u64 = 1;

    /// Current lifecycle state.
    pub fn state(&self) -> AnimalState {
        if self.alive {
            AnimalState::Active
        } else {
            AnimalState::Deceased
        }
    }
}
