//! # Epoch-Scoped Grants
//!
//! Table of `(animal, grantee) → granted_at_epoch`. A grant is live only
//! while the animal's ownership epoch still equals the epoch it was issued
//! at; advancing the epoch revokes every outstanding grant at once, with no
//! sweep.
//!
//! The ledger keeps two independent tables of this shape: vet write
//! authorizations and per-animal transfer approvals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use petid_core::{AccountId, AnimalId};

/// Grants keyed by animal, then grantee.
///
/// Nested maps rather than a tuple key so the table serializes as a JSON
/// object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochGrants {
    grants: BTreeMap<AnimalId, BTreeMap<AccountId, u64>>,
}

impl EpochGrants {
    /// Record a grant at `epoch`, replacing any earlier grant to the same
    /// grantee for the same animal.
    pub fn grant(&mut self, animal_id: &AnimalId, grantee: &AccountId, epoch: u64) {
        self.grants
            .entry(animal_id.clone())
            .or_default()
            .insert(grantee.clone(), epoch);
    }

    /// Epoch the grant was issued at, if one exists (live or stale).
    pub fn granted_at(&self, animal_id: &AnimalId, grantee: &AccountId) -> Option<u64> {
        self.grants
            .get(animal_id)
            .and_then(|per_animal| per_animal.get(grantee))
            .copied()
    }

    /// Whether a grant exists and was issued at `current_epoch`.
    pub fn is_live(&self, animal_id: &AnimalId, grantee: &AccountId, current_epoch: u64) -> bool {
        self.granted_at(animal_id, grantee) == Some(current_epoch)
    }

    /// Delete a grant. Returns the epoch it carried.
    pub fn consume(&mut self, animal_id: &AnimalId, grantee: &AccountId) -> Option<u64> {
        let per_animal = self.grants.get_mut(animal_id)?;
        let epoch = per_animal.remove(grantee);
        if per_animal.is_empty() {
            self.grants.remove(animal_id);
        }
        epoch
    }

    /// Delete every grant held for the animal.
    pub fn clear_animal(&mut self, animal_id: &AnimalId) -> usize {
        self.grants.remove(animal_id).map_or(0, |m| m.len())
    }

    /// Total stored grants, live or stale.
    pub fn len(&self) -> usize {
        self.grants.values().map(BTreeMap::len).sum()
    }

    /// Whether no grants are stored.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
