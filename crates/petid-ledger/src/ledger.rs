//! # Identity Ledger
//!
//! Owns the animal table, both grant tables, the operator table and the
//! vet → license bindings, and is the only writer of the [`RecordLog`].
//!
//! ## Atomicity
//!
//! Every mutating operation runs in two phases. The check phase reads the
//! clock once, consults the license directory and evaluates every
//! precondition without touching state. The commit phase performs writes
//! that cannot fail once the checks have passed. A rejected operation
//! therefore leaves the ledger exactly as it found it.
//!
//! ## Transfer gating
//!
//! ```text
//! transfer_ownership
//!   1. ACTIVE            → AnimalNotActive | AnimalDeceased
//!   2. vaccine current   → VaccinationExpired
//!   3. not lost          → ReportedLost
//!   4. old enough        → BelowMinimumAge
//!   5. from == owner     → NotOwner
//!      caller may move   → NotAuthorized
//!   commit: owner = to, epoch += 1, transfer grants cleared
//! ```
//!
//! Vet authorizations are never swept on transfer. The epoch bump alone
//! makes them stale.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use petid_core::{AccountId, AnimalId, Clock, ContentRef, LicenseId, Timestamp};
use petid_records::{History, MedicalRecord, RecordHandle, RecordLog, RecordType};

use crate::animal::{AnimalIdentity, AnimalState};
use crate::config::LedgerConfig;
use crate::directory::{DirectoryError, LicenseOracle};
use crate::error::{LedgerError, LicenseRejection};
use crate::grants::EpochGrants;

// ─── Snapshot ────────────────────────────────────────────────────────

/// Complete persistent state of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Registered animals.
    pub animals: BTreeMap<AnimalId, AnimalIdentity>,
    /// Owner-granted, single-use vet write authorizations.
    pub vet_authorizations: EpochGrants,
    /// Owner-granted, per-animal transfer approvals.
    pub transfer_grants: EpochGrants,
    /// Account-wide operators, keyed by owner.
    pub operators: BTreeMap<AccountId, BTreeSet<AccountId>>,
    /// Vet → linked license.
    pub license_bindings: BTreeMap<AccountId, LicenseId>,
    /// The medical record log.
    pub records: RecordLog,
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// The identity, ownership and authorization ledger.
pub struct IdentityLedger {
    state: LedgerSnapshot,
    oracle: Arc<dyn LicenseOracle>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl std::fmt::Debug for IdentityLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityLedger")
            .field("animals", &self.state.animals.len())
            .field("records", &self.state.records.total_records())
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IdentityLedger {
    /// Create an empty ledger.
    pub fn new(
        oracle: Arc<dyn LicenseOracle>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            state: LedgerSnapshot::default(),
            oracle,
            clock,
            config,
        }
    }

    /// Rebuild a ledger from a snapshot, checking its structural invariants.
    pub fn restore(
        snapshot: LedgerSnapshot,
        oracle: Arc<dyn LicenseOracle>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        for (key, animal) in &snapshot.animals {
            if key != &animal.animal_id {
                return Err(LedgerError::Integrity(format!(
                    "animal stored under {key} carries id {}",
                    animal.animal_id
                )));
            }
            if animal.ownership_epoch < AnimalIdentity::INITIAL_EPOCH {
                return Err(LedgerError::Integrity(format!(
                    "animal {key} has epoch {}",
                    animal.ownership_epoch
                )));
            }
            if !snapshot.records.contains(key) {
                return Err(LedgerError::Integrity(format!(
                    "animal {key} has no record stream"
                )));
            }
        }
        Ok(Self {
            state: snapshot,
            oracle,
            clock,
            config,
        })
    }

    /// Copy of the full persistent state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Mutating operations ──────────────────────────────────────────

    /// Register a new animal. The caller must be a licensed vet.
    pub fn register_animal(
        &mut self,
        vet: &AccountId,
        owner: AccountId,
        animal_id: AnimalId,
        metadata_ref: ContentRef,
        birth_date: Option<Timestamp>,
    ) -> Result<AnimalId, LedgerError> {
        let result = self.try_register_animal(vet, owner, animal_id, metadata_ref, birth_date);
        observe("register_animal", result)
    }

    fn try_register_animal(
        &mut self,
        vet: &AccountId,
        owner: AccountId,
        animal_id: AnimalId,
        metadata_ref: ContentRef,
        birth_date: Option<Timestamp>,
    ) -> Result<AnimalId, LedgerError> {
        self.verify_license(vet)?;
        // Ids are never reused, and a stream without an identity still
        // counts as taken.
        if self.state.animals.contains_key(&animal_id) || self.state.records.contains(&animal_id) {
            return Err(LedgerError::AlreadyRegistered(animal_id));
        }
        let now = self.clock.now();

        self.state.records.open(&animal_id, birth_date)?;
        self.state.animals.insert(
            animal_id.clone(),
            AnimalIdentity {
                animal_id: animal_id.clone(),
                owner: owner.clone(),
                metadata_ref,
                is_lost: false,
                ownership_epoch: AnimalIdentity::INITIAL_EPOCH,
                alive: true,
                registered_at: now,
                registered_by: vet.clone(),
            },
        );
        tracing::info!(animal = %animal_id, %owner, %vet, "animal registered");
        Ok(animal_id)
    }

    /// Authorize `vet` to write one medical record at the current epoch.
    ///
    /// The vet's license is not checked here; it is checked when the grant
    /// is used.
    pub fn approve_vet(
        &mut self,
        owner: &AccountId,
        animal_id: &AnimalId,
        vet: &AccountId,
    ) -> Result<(), LedgerError> {
        let result = self.try_approve_vet(owner, animal_id, vet);
        observe("approve_vet", result)
    }

    fn try_approve_vet(
        &mut self,
        owner: &AccountId,
        animal_id: &AnimalId,
        vet: &AccountId,
    ) -> Result<(), LedgerError> {
        let animal = self.active_animal(animal_id)?;
        require_owner(animal, owner)?;
        let epoch = animal.ownership_epoch;

        self.state.vet_authorizations.grant(animal_id, vet, epoch);
        tracing::info!(animal = %animal_id, %vet, epoch, "vet authorized");
        Ok(())
    }

    /// Append a medical record, consuming the vet's grant.
    pub fn add_medical_record(
        &mut self,
        vet: &AccountId,
        animal_id: &AnimalId,
        description: ContentRef,
        record_type: RecordType,
        days_valid: u32,
    ) -> Result<RecordHandle, LedgerError> {
        let result = self.try_add_medical_record(vet, animal_id, description, record_type, days_valid);
        observe("add_medical_record", result)
    }

    fn try_add_medical_record(
        &mut self,
        vet: &AccountId,
        animal_id: &AnimalId,
        description: ContentRef,
        record_type: RecordType,
        days_valid: u32,
    ) -> Result<RecordHandle, LedgerError> {
        let epoch = self.active_animal(animal_id)?.ownership_epoch;
        self.verify_license(vet)?;
        if !self.state.vet_authorizations.is_live(animal_id, vet, epoch) {
            return Err(LedgerError::AuthorizationExpiredOrMissing {
                vet: vet.clone(),
                animal_id: animal_id.clone(),
            });
        }
        let now = self.clock.now();

        let appended = self
            .state
            .records
            .append(animal_id, vet, record_type, description, days_valid, now)?;
        self.state.vet_authorizations.consume(animal_id, vet);
        if appended.terminal {
            self.freeze(animal_id);
        }
        tracing::info!(record = %appended.handle, %vet, %record_type, "medical record added");
        Ok(appended.handle)
    }

    /// Set or clear the lost flag. Setting the current value is a no-op.
    pub fn set_lost_status(
        &mut self,
        owner: &AccountId,
        animal_id: &AnimalId,
        lost: bool,
    ) -> Result<(), LedgerError> {
        let result = self.try_set_lost_status(owner, animal_id, lost);
        observe("set_lost_status", result)
    }

    fn try_set_lost_status(
        &mut self,
        owner: &AccountId,
        animal_id: &AnimalId,
        lost: bool,
    ) -> Result<(), LedgerError> {
        let animal = self.active_animal(animal_id)?;
        require_owner(animal, owner)?;
        if animal.is_lost == lost {
            return Ok(());
        }

        self.animal_mut(animal_id)?.is_lost = lost;
        tracing::info!(animal = %animal_id, lost, "lost status changed");
        Ok(())
    }

    /// Approve `operator` to transfer this animal once, at the current epoch.
    pub fn approve_transfer(
        &mut self,
        owner: &AccountId,
        animal_id: &AnimalId,
        operator: &AccountId,
    ) -> Result<(), LedgerError> {
        let result = self.try_approve_transfer(owner, animal_id, operator);
        observe("approve_transfer", result)
    }

    fn try_approve_transfer(
        &mut self,
        owner: &AccountId,
        animal_id: &AnimalId,
        operator: &AccountId,
    ) -> Result<(), LedgerError> {
        let animal = self.active_animal(animal_id)?;
        require_owner(animal, owner)?;
        let epoch = animal.ownership_epoch;

        self.state.transfer_grants.grant(animal_id, operator, epoch);
        tracing::info!(animal = %animal_id, %operator, epoch, "transfer approved");
        Ok(())
    }

    /// Grant or revoke `operator` the right to transfer every animal the
    /// owner holds, now or later.
    pub fn set_operator_approval(
        &mut self,
        owner: &AccountId,
        operator: &AccountId,
        approved: bool,
    ) {
        let changed = if approved {
            self.state
                .operators
                .entry(owner.clone())
                .or_default()
                .insert(operator.clone())
        } else {
            let removed = self
                .state
                .operators
                .get_mut(owner)
                .is_some_and(|ops| ops.remove(operator));
            if self.state.operators.get(owner).is_some_and(BTreeSet::is_empty) {
                self.state.operators.remove(owner);
            }
            removed
        };
        if changed {
            tracing::info!(%owner, %operator, approved, "operator approval changed");
        }
        count("set_operator_approval", "ok");
    }

    /// Move the animal from `from` to `to`. Returns the new epoch.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        animal_id: &AnimalId,
        from: &AccountId,
        to: AccountId,
    ) -> Result<u64, LedgerError> {
        let result = self.try_transfer_ownership(caller, animal_id, from, to);
        observe("transfer_ownership", result)
    }

    fn try_transfer_ownership(
        &mut self,
        caller: &AccountId,
        animal_id: &AnimalId,
        from: &AccountId,
        to: AccountId,
    ) -> Result<u64, LedgerError> {
        let now = self.clock.now();
        let animal = self.active_animal(animal_id)?;

        if !self.state.records.is_vaccine_current(animal_id, now) {
            return Err(LedgerError::VaccinationExpired(animal_id.clone()));
        }
        if animal.is_lost {
            return Err(LedgerError::ReportedLost(animal_id.clone()));
        }
        if let Some(birth_date) = self.state.records.birth_date(animal_id) {
            let eligible_at = birth_date.plus_days(self.config.min_transfer_age_days);
            if now < eligible_at {
                return Err(LedgerError::BelowMinimumAge {
                    animal_id: animal_id.clone(),
                    eligible_at,
                });
            }
        }
        if from != &animal.owner {
            return Err(LedgerError::NotOwner {
                caller: from.clone(),
                animal_id: animal_id.clone(),
            });
        }
        if !self.may_transfer(animal, caller) {
            return Err(LedgerError::NotAuthorized {
                caller: caller.clone(),
                animal_id: animal_id.clone(),
            });
        }
        let new_epoch = animal.ownership_epoch.checked_add(1).ok_or_else(|| {
            LedgerError::Integrity(format!("ownership epoch overflow for animal {animal_id}"))
        })?;

        let animal = self.animal_mut(animal_id)?;
        let previous = std::mem::replace(&mut animal.owner, to);
        animal.ownership_epoch = new_epoch;
        let to = animal.owner.clone();
        self.state.transfer_grants.clear_animal(animal_id);
        tracing::info!(
            animal = %animal_id,
            from = %previous,
            %to,
            %caller,
            epoch = new_epoch,
            "ownership transferred"
        );
        Ok(new_epoch)
    }

    /// Record the animal's death. Needs a licensed vet but no owner grant.
    pub fn report_decease(
        &mut self,
        vet: &AccountId,
        animal_id: &AnimalId,
        certificate_ref: ContentRef,
    ) -> Result<RecordHandle, LedgerError> {
        let result = self.try_report_decease(vet, animal_id, certificate_ref);
        observe("report_decease", result)
    }

    fn try_report_decease(
        &mut self,
        vet: &AccountId,
        animal_id: &AnimalId,
        certificate_ref: ContentRef,
    ) -> Result<RecordHandle, LedgerError> {
        self.active_animal(animal_id)?;
        self.verify_license(vet)?;
        let now = self.clock.now();

        let appended = self.state.records.append(
            animal_id,
            vet,
            RecordType::Deceased,
            certificate_ref,
            0,
            now,
        )?;
        self.freeze(animal_id);
        tracing::info!(record = %appended.handle, %vet, "death reported");
        Ok(appended.handle)
    }

    /// Bind the caller to `license_id`, replacing any earlier binding.
    /// Returns the previous binding.
    pub fn link_vet_license(
        &mut self,
        vet: &AccountId,
        license_id: LicenseId,
    ) -> Result<Option<LicenseId>, LedgerError> {
        let result = self.try_link_vet_license(vet, license_id);
        observe("link_vet_license", result)
    }

    fn try_link_vet_license(
        &mut self,
        vet: &AccountId,
        license_id: LicenseId,
    ) -> Result<Option<LicenseId>, LedgerError> {
        let not_owner = || LedgerError::NotLicenseOwner {
            vet: vet.clone(),
            license_id: license_id.clone(),
        };
        match self.oracle.license_owner(&license_id) {
            Ok(holder) if &holder == vet => {}
            Ok(_) => return Err(not_owner()),
            Err(e) => {
                tracing::warn!(license = %license_id, error = %e, "license owner lookup failed");
                return Err(not_owner());
            }
        }
        match self.oracle.is_license_valid(&license_id) {
            Ok(true) => {}
            Ok(false) => return Err(LedgerError::LicenseInvalid(license_id)),
            Err(e) => {
                tracing::warn!(license = %license_id, error = %e, "license validity lookup failed");
                return Err(LedgerError::LicenseInvalid(license_id));
            }
        }

        let previous = self
            .state
            .license_bindings
            .insert(vet.clone(), license_id.clone());
        tracing::info!(%vet, license = %license_id, "vet license linked");
        Ok(previous)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The animal's identity row.
    pub fn animal(&self, animal_id: &AnimalId) -> Option<&AnimalIdentity> {
        self.state.animals.get(animal_id)
    }

    /// Lifecycle state of an id.
    pub fn state(&self, animal_id: &AnimalId) -> AnimalState {
        self.animal(animal_id)
            .map_or(AnimalState::Unregistered, AnimalIdentity::state)
    }

    /// Current owner.
    pub fn owner_of(&self, animal_id: &AnimalId) -> Option<&AccountId> {
        self.animal(animal_id).map(|a| &a.owner)
    }

    /// Whether `vet` holds a live write grant for the animal.
    pub fn is_vet_authorized(&self, animal_id: &AnimalId, vet: &AccountId) -> bool {
        self.animal(animal_id).is_some_and(|a| {
            a.alive
                && self
                    .state
                    .vet_authorizations
                    .is_live(animal_id, vet, a.ownership_epoch)
        })
    }

    /// Whether `operator` holds a live per-animal transfer approval.
    pub fn is_transfer_approved(&self, animal_id: &AnimalId, operator: &AccountId) -> bool {
        self.animal(animal_id).is_some_and(|a| {
            a.alive
                && self
                    .state
                    .transfer_grants
                    .is_live(animal_id, operator, a.ownership_epoch)
        })
    }

    /// Whether `operator` is an account-wide operator for `owner`.
    pub fn is_operator(&self, owner: &AccountId, operator: &AccountId) -> bool {
        self.state
            .operators
            .get(owner)
            .is_some_and(|ops| ops.contains(operator))
    }

    /// Whether the animal's vaccination is current right now.
    pub fn is_vaccine_current(&self, animal_id: &AnimalId) -> bool {
        self.state
            .records
            .is_vaccine_current(animal_id, self.clock.now())
    }

    /// Expiry of the latest vaccination.
    pub fn vaccine_expires_at(&self, animal_id: &AnimalId) -> Option<Timestamp> {
        self.state.records.vaccine_expires_at(animal_id)
    }

    /// Recorded birth date.
    pub fn birth_date(&self, animal_id: &AnimalId) -> Option<Timestamp> {
        self.state.records.birth_date(animal_id)
    }

    /// License currently bound to `vet`.
    pub fn linked_license(&self, vet: &AccountId) -> Option<&LicenseId> {
        self.state.license_bindings.get(vet)
    }

    /// Medical history, oldest first. Readable in every state.
    pub fn history(&self, animal_id: &AnimalId) -> History<'_> {
        self.state.records.history(animal_id)
    }

    /// A single record by handle.
    pub fn record(&self, handle: &RecordHandle) -> Option<&MedicalRecord> {
        self.state.records.get(handle)
    }

    /// Animals currently owned by `owner`, ordered by id.
    pub fn animals_owned_by<'a>(
        &'a self,
        owner: &'a AccountId,
    ) -> impl Iterator<Item = &'a AnimalIdentity> + 'a {
        self.state.animals.values().filter(move |a| &a.owner == owner)
    }

    /// Number of registered animals, deceased included.
    pub fn animal_count(&self) -> usize {
        self.state.animals.len()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn active_animal(&self, animal_id: &AnimalId) -> Result<&AnimalIdentity, LedgerError> {
        match self.state.animals.get(animal_id) {
            None => Err(LedgerError::AnimalNotActive(animal_id.clone())),
            Some(a) if !a.alive => Err(LedgerError::AnimalDeceased(animal_id.clone())),
            Some(a) => Ok(a),
        }
    }

    fn animal_mut(&mut self, animal_id: &AnimalId) -> Result<&mut AnimalIdentity, LedgerError> {
        self.state
            .animals
            .get_mut(animal_id)
            .ok_or_else(|| LedgerError::AnimalNotActive(animal_id.clone()))
    }

    fn may_transfer(&self, animal: &AnimalIdentity, caller: &AccountId) -> bool {
        caller == &animal.owner
            || self
                .state
                .transfer_grants
                .is_live(&animal.animal_id, caller, animal.ownership_epoch)
            || self.is_operator(&animal.owner, caller)
    }

    /// Mark the animal deceased and drop its outstanding grants.
    fn freeze(&mut self, animal_id: &AnimalId) {
        if let Some(animal) = self.state.animals.get_mut(animal_id) {
            animal.alive = false;
        }
        self.state.vet_authorizations.clear_animal(animal_id);
        self.state.transfer_grants.clear_animal(animal_id);
    }

    /// Re-resolve the vet's bound license through the directory.
    ///
    /// Fail-closed: any directory error rejects the vet.
    fn verify_license(&self, vet: &AccountId) -> Result<(), LedgerError> {
        let reject = |reason| LedgerError::NotLicensed {
            vet: vet.clone(),
            reason,
        };
        let license_id = self
            .state
            .license_bindings
            .get(vet)
            .ok_or_else(|| reject(LicenseRejection::Unlinked))?;

        let lookup_failed = |e: DirectoryError| {
            tracing::warn!(%vet, license = %license_id, error = %e, "license directory lookup failed");
            match e {
                DirectoryError::NotFound(_) => reject(LicenseRejection::Invalid),
                DirectoryError::Unavailable(_) => reject(LicenseRejection::DirectoryUnavailable),
            }
        };

        let holder = self.oracle.license_owner(license_id).map_err(lookup_failed)?;
        if &holder != vet {
            return Err(reject(LicenseRejection::NotHolder));
        }
        if !self.oracle.is_license_valid(license_id).map_err(lookup_failed)? {
            return Err(reject(LicenseRejection::Invalid));
        }
        Ok(())
    }
}

fn require_owner(animal: &AnimalIdentity, caller: &AccountId) -> Result<(), LedgerError> {
    if &animal.owner != caller {
        return Err(LedgerError::NotOwner {
            caller: caller.clone(),
            animal_id: animal.animal_id.clone(),
        });
    }
    Ok(())
}

/// Count the outcome and log rejections.
fn observe<T>(operation: &'static str, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            tracing::debug!(operation, code = e.code(), error = %e, "operation rejected");
            e.code()
        }
    };
    count(operation, outcome);
    result
}

fn count(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "petid_ledger_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::LicenseRegistry;
    use petid_core::ManualClock;

    struct Fixture {
        clock: Arc<ManualClock>,
        licenses: Arc<LicenseRegistry>,
        ledger: IdentityLedger,
    }

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn chip(s: &str) -> AnimalId {
        AnimalId::new(s).unwrap()
    }

    fn lic(s: &str) -> LicenseId {
        LicenseId::new(s).unwrap()
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Timestamp::parse("2026-03-01T09:00:00Z").unwrap(),
        ));
        let licenses = Arc::new(LicenseRegistry::new(clock.clone()));
        licenses.issue(lic("L-1"), acct("vet"), None).unwrap();
        let mut ledger = IdentityLedger::new(licenses.clone(), clock.clone(), LedgerConfig::default());
        ledger.link_vet_license(&acct("vet"), lic("L-1")).unwrap();
        Fixture {
            clock,
            licenses,
            ledger,
        }
    }

    fn register(f: &mut Fixture, id: &str) {
        f.ledger
            .register_animal(&acct("vet"), acct("owner"), chip(id), ContentRef::empty(), None)
            .unwrap();
    }

    #[test]
    fn test_register_requires_linked_license() {
        let mut f = fixture();
        let err = f
            .ledger
            .register_animal(&acct("stranger"), acct("owner"), chip("a"), ContentRef::empty(), None)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::NotLicensed {
                vet: acct("stranger"),
                reason: LicenseRejection::Unlinked
            }
        );
    }

    #[test]
    fn test_register_rechecks_license_every_call() {
        let mut f = fixture();
        register(&mut f, "a");
        f.licenses.suspend(&lic("L-1"), "audit").unwrap();
        let err = f
            .ledger
            .register_animal(&acct("vet"), acct("owner"), chip("b"), ContentRef::empty(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotLicensed {
                reason: LicenseRejection::Invalid,
                ..
            }
        ));
    }

    #[test]
    fn test_register_detects_reassigned_license() {
        let mut f = fixture();
        f.licenses
            .reassign(&lic("L-1"), acct("other-vet"), "sold")
            .unwrap();
        let err = f
            .ledger
            .register_animal(&acct("vet"), acct("owner"), chip("a"), ContentRef::empty(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotLicensed {
                reason: LicenseRejection::NotHolder,
                ..
            }
        ));
    }

    #[test]
    fn test_register_duplicate() {
        let mut f = fixture();
        register(&mut f, "a");
        let err = f
            .ledger
            .register_animal(&acct("vet"), acct("x"), chip("a"), ContentRef::empty(), None)
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRegistered(chip("a")));
    }

    #[test]
    fn test_register_sets_initial_state() {
        let mut f = fixture();
        register(&mut f, "a");
        let a = f.ledger.animal(&chip("a")).unwrap();
        assert_eq!(a.ownership_epoch, 1);
        assert!(a.alive);
        assert!(!a.is_lost);
        assert_eq!(a.registered_by, acct("vet"));
        assert_eq!(f.ledger.state(&chip("a")), AnimalState::Active);
        assert_eq!(f.ledger.state(&chip("zzz")), AnimalState::Unregistered);
    }

    #[test]
    fn test_approve_vet_requires_owner() {
        let mut f = fixture();
        register(&mut f, "a");
        let err = f
            .ledger
            .approve_vet(&acct("mallory"), &chip("a"), &acct("vet"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner { .. }));
        assert_eq!(
            f.ledger.approve_vet(&acct("owner"), &chip("zzz"), &acct("vet")),
            Err(LedgerError::AnimalNotActive(chip("zzz")))
        );
    }

    #[test]
    fn test_lost_status_is_idempotent() {
        let mut f = fixture();
        register(&mut f, "a");
        f.ledger.set_lost_status(&acct("owner"), &chip("a"), true).unwrap();
        f.ledger.set_lost_status(&acct("owner"), &chip("a"), true).unwrap();
        assert!(f.ledger.animal(&chip("a")).unwrap().is_lost);
        f.ledger.set_lost_status(&acct("owner"), &chip("a"), false).unwrap();
        assert!(!f.ledger.animal(&chip("a")).unwrap().is_lost);
    }

    #[test]
    fn test_link_rejects_foreign_and_invalid_licenses() {
        let mut f = fixture();
        f.licenses.issue(lic("L-2"), acct("vet-2"), None).unwrap();
        assert_eq!(
            f.ledger.link_vet_license(&acct("vet"), lic("L-2")),
            Err(LedgerError::NotLicenseOwner {
                vet: acct("vet"),
                license_id: lic("L-2")
            })
        );
        f.licenses.suspend(&lic("L-2"), "audit").unwrap();
        assert_eq!(
            f.ledger.link_vet_license(&acct("vet-2"), lic("L-2")),
            Err(LedgerError::LicenseInvalid(lic("L-2")))
        );
        assert!(matches!(
            f.ledger.link_vet_license(&acct("vet"), lic("missing")),
            Err(LedgerError::NotLicenseOwner { .. })
        ));
    }

    #[test]
    fn test_relink_overwrites_binding() {
        let mut f = fixture();
        f.licenses.issue(lic("L-9"), acct("vet"), None).unwrap();
        let previous = f.ledger.link_vet_license(&acct("vet"), lic("L-9")).unwrap();
        assert_eq!(previous, Some(lic("L-1")));
        assert_eq!(f.ledger.linked_license(&acct("vet")), Some(&lic("L-9")));
    }

    #[test]
    fn test_operator_approval_toggles() {
        let mut f = fixture();
        f.ledger.set_operator_approval(&acct("owner"), &acct("broker"), true);
        assert!(f.ledger.is_operator(&acct("owner"), &acct("broker")));
        f.ledger.set_operator_approval(&acct("owner"), &acct("broker"), false);
        assert!(!f.ledger.is_operator(&acct("owner"), &acct("broker")));
        assert!(f.ledger.snapshot().operators.is_empty());
    }

    #[test]
    fn test_animals_owned_by() {
        let mut f = fixture();
        register(&mut f, "a");
        register(&mut f, "b");
        let owned: Vec<_> = f
            .ledger
            .animals_owned_by(&acct("owner"))
            .map(|a| a.animal_id.as_str().to_string())
            .collect();
        assert_eq!(owned, ["a", "b"]);
        assert_eq!(f.ledger.animals_owned_by(&acct("nobody")).count(), 0);
    }

    #[test]
    fn test_restore_rejects_missing_stream() {
        let mut f = fixture();
        register(&mut f, "a");
        let mut snapshot = f.ledger.snapshot();
        snapshot.records = RecordLog::new();
        let err = IdentityLedger::restore(
            snapshot,
            f.licenses.clone(),
            f.clock.clone(),
            LedgerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Integrity(_)));
    }

    #[test]
    fn test_snapshot_json_roundtrip_restores_behaviour() {
        let mut f = fixture();
        register(&mut f, "a");
        f.ledger.approve_vet(&acct("owner"), &chip("a"), &acct("vet")).unwrap();
        let json = serde_json::to_string(&f.ledger.snapshot()).unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let restored = IdentityLedger::restore(
            snapshot,
            f.licenses.clone(),
            f.clock.clone(),
            LedgerConfig::default(),
        )
        .unwrap();
        assert!(restored.is_vet_authorized(&chip("a"), &acct("vet")));
        assert_eq!(restored.snapshot(), f.ledger.snapshot());
    }
}
