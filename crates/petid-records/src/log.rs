//! # Record Log
//!
//! Arena of immutable [`MedicalRecord`]s with a per-animal position index
//! and a small derived-facts table. The derivation (vaccine expiry) runs
//! inside [`RecordLog::append`] and nowhere else.
//!
//! The log never reads a clock. Callers pass `now` explicitly, which keeps
//! every method deterministic and lets the ledger evaluate all of an
//! operation's time checks against one instant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use petid_core::{AccountId, AnimalId, ContentRef, Timestamp};

use crate::error::RecordError;
use crate::record::{MedicalRecord, RecordHandle, RecordType};

/// Per-animal facts derived from (or set alongside) the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFacts {
    /// Expiry of the most recent vaccination. `None` = never vaccinated.
    pub vaccine_expires_at: Option<Timestamp>,
    /// Birth date, write-once.
    pub birth_date: Option<Timestamp>,
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Handle of the new record.
    pub handle: RecordHandle,
    /// The record was a `DECEASED` entry; the caller must freeze the animal.
    pub terminal: bool,
}

/// The append-only medical record log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLog {
    entries: Vec<MedicalRecord>,
    index: BTreeMap<AnimalId, Vec<usize>>,
    derived: BTreeMap<AnimalId, DerivedFacts>,
}

impl RecordLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty stream for a newly registered animal, recording its
    /// birth date in the same step when one is known.
    pub fn open(
        &mut self,
        animal_id: &AnimalId,
        birth_date: Option<Timestamp>,
    ) -> Result<(), RecordError> {
        if self.index.contains_key(animal_id) {
            return Err(RecordError::AlreadyOpen(animal_id.clone()));
        }
        self.index.insert(animal_id.clone(), Vec::new());
        self.derived.insert(
            animal_id.clone(),
            DerivedFacts {
                vaccine_expires_at: None,
                birth_date,
            },
        );
        Ok(())
    }

    /// Whether a stream exists for the animal.
    pub fn contains(&self, animal_id: &AnimalId) -> bool {
        self.index.contains_key(animal_id)
    }

    /// Append a record.
    ///
    /// A `VACCINE` record overwrites the animal's vaccine expiry with
    /// `now + days_valid` days. A `DECEASED` record has no derived side
    /// effect but is reported back as `terminal`.
    pub fn append(
        &mut self,
        animal_id: &AnimalId,
        vet: &AccountId,
        record_type: RecordType,
        description: ContentRef,
        days_valid: u32,
        now: Timestamp,
    ) -> Result<Appended, RecordError> {
        let positions = self
            .index
            .get_mut(animal_id)
            .ok_or_else(|| RecordError::UnknownAnimal(animal_id.clone()))?;
        let sequence = u64::try_from(positions.len())
            .map_err(|_| RecordError::SequenceExhausted(animal_id.clone()))?;

        let record = MedicalRecord {
            sequence,
            timestamp: now,
            animal_id: animal_id.clone(),
            vet: vet.clone(),
            record_type,
            description,
            days_valid,
        };
        let handle = record.handle();

        positions.push(self.entries.len());
        self.entries.push(record);

        if record_type == RecordType::Vaccine {
            let expires_at = now.plus_days(days_valid);
            self.derived
                .entry(animal_id.clone())
                .or_default()
                .vaccine_expires_at = Some(expires_at);
            tracing::debug!(animal = %animal_id, %expires_at, "vaccine expiry refreshed");
        }

        Ok(Appended {
            handle,
            terminal: record_type.is_terminal(),
        })
    }

    /// Whether the animal's latest vaccination is still inside its window.
    ///
    /// Never-vaccinated and unknown animals are treated as expired.
    pub fn is_vaccine_current(&self, animal_id: &AnimalId, now: Timestamp) -> bool {
        self.vaccine_expires_at(animal_id)
            .is_some_and(|expires_at| now < expires_at)
    }

    /// Expiry of the latest vaccination, if any.
    pub fn vaccine_expires_at(&self, animal_id: &AnimalId) -> Option<Timestamp> {
        self.derived
            .get(animal_id)
            .and_then(|facts| facts.vaccine_expires_at)
    }

    /// Set the animal's birth date. Write-once: a second call is rejected.
    pub fn set_birth_date(
        &mut self,
        animal_id: &AnimalId,
        birth_date: Timestamp,
    ) -> Result<(), RecordError> {
        let facts = self
            .derived
            .get_mut(animal_id)
            .ok_or_else(|| RecordError::UnknownAnimal(animal_id.clone()))?;
        if facts.birth_date.is_some() {
            return Err(RecordError::BirthDateAlreadySet(animal_id.clone()));
        }
        facts.birth_date = Some(birth_date);
        Ok(())
    }

    /// The animal's birth date, if one was recorded.
    pub fn birth_date(&self, animal_id: &AnimalId) -> Option<Timestamp> {
        self.derived.get(animal_id).and_then(|facts| facts.birth_date)
    }

    /// Derived facts for the animal.
    pub fn facts(&self, animal_id: &AnimalId) -> Option<&DerivedFacts> {
        self.derived.get(animal_id)
    }

    /// The animal's records, oldest first.
    ///
    /// The returned iterator is finite and restartable (`Clone`); reverse
    /// it for newest-first. An unknown animal yields nothing.
    pub fn history(&self, animal_id: &AnimalId) -> History<'_> {
        let positions = self
            .index
            .get(animal_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        History {
            entries: &self.entries,
            positions: positions.iter(),
        }
    }

    /// Look up one record by handle without walking the history.
    pub fn get(&self, handle: &RecordHandle) -> Option<&MedicalRecord> {
        let sequence = usize::try_from(handle.sequence).ok()?;
        let &pos = self.index.get(&handle.animal_id)?.get(sequence)?;
        self.entries.get(pos)
    }

    /// Number of records held for the animal.
    pub fn len(&self, animal_id: &AnimalId) -> usize {
        self.index.get(animal_id).map_or(0, Vec::len)
    }

    /// Whether the animal has no records.
    pub fn is_empty(&self, animal_id: &AnimalId) -> bool {
        self.len(animal_id) == 0
    }

    /// Total records across all animals.
    pub fn total_records(&self) -> usize {
        self.entries.len()
    }
}

/// Lazy, restartable view over one animal's history.
#[derive(Debug, Clone)]
pub struct History<'a> {
    entries: &'a [MedicalRecord],
    positions: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for History<'a> {
    type Item = &'a MedicalRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.positions.next().and_then(|&pos| self.entries.get(pos))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.positions.nth(n).and_then(|&pos| self.entries.get(pos))
    }
}

impl DoubleEndedIterator for History<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.positions
            .next_back()
            .and_then(|&pos| self.entries.get(pos))
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.positions
            .nth_back(n)
            .and_then(|&pos| self.entries.get(pos))
    }
}

impl ExactSizeIterator for History<'_> {}
