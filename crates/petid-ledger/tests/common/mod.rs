//! Shared fixture: one licensed vet, a manual clock and an empty ledger
//! whose license directory can be taken offline.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use petid_core::{AccountId, AnimalId, ContentRef, LicenseId, ManualClock, Timestamp};
use petid_ledger::{
    DirectoryError, IdentityLedger, LedgerConfig, LicenseOracle, LicenseRegistry,
};
use petid_records::RecordType;

pub struct World {
    pub clock: Arc<ManualClock>,
    pub licenses: Arc<LicenseRegistry>,
    pub directory: Arc<OutageDirectory>,
    pub ledger: IdentityLedger,
}

/// Serves lookups from a [`LicenseRegistry`] until taken down, then
/// answers every lookup with [`DirectoryError::Unavailable`].
pub struct OutageDirectory {
    registry: Arc<LicenseRegistry>,
    down: AtomicBool,
}

impl OutageDirectory {
    pub fn new(registry: Arc<LicenseRegistry>) -> Self {
        Self {
            registry,
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl LicenseOracle for OutageDirectory {
    fn is_license_valid(&self, license_id: &LicenseId) -> Result<bool, DirectoryError> {
        self.check()?;
        self.registry.is_license_valid(license_id)
    }

    fn license_owner(&self, license_id: &LicenseId) -> Result<AccountId, DirectoryError> {
        self.check()?;
        self.registry.license_owner(license_id)
    }
}

pub fn acct(s: &str) -> AccountId {
    AccountId::new(s).expect("test account id")
}

pub fn chip(s: &str) -> AnimalId {
    AnimalId::new(s).expect("test animal id")
}

pub fn lic(s: &str) -> LicenseId {
    LicenseId::new(s).expect("test license id")
}

pub fn content(s: &str) -> ContentRef {
    ContentRef::new(s).expect("test content ref")
}

pub fn start() -> Timestamp {
    Timestamp::parse("2026-01-01T00:00:00Z").expect("test timestamp")
}

pub const VET: &str = "vet-1";
pub const OWNER: &str = "owner-1";

/// A world where `vet-1` holds valid license `LIC-1`, already linked.
pub fn world() -> World {
    let clock = Arc::new(ManualClock::new(start()));
    let licenses = Arc::new(LicenseRegistry::new(clock.clone()));
    licenses
        .issue(lic("LIC-1"), acct(VET), None)
        .expect("issue license");
    let directory = Arc::new(OutageDirectory::new(licenses.clone()));
    let mut ledger =
        IdentityLedger::new(directory.clone(), clock.clone(), LedgerConfig::default());
    ledger
        .link_vet_license(&acct(VET), lic("LIC-1"))
        .expect("link license");
    World {
        clock,
        licenses,
        directory,
        ledger,
    }
}

impl World {
    /// Register `id` to `owner-1` with the given birth date.
    pub fn register(&mut self, id: &str, birth_date: Option<Timestamp>) {
        self.ledger
            .register_animal(&acct(VET), acct(OWNER), chip(id), content("ipfs://meta"), birth_date)
            .expect("register animal");
    }

    /// Owner grants the vet, vet writes a vaccine record valid for `days`.
    pub fn vaccinate(&mut self, id: &str, days: u32) {
        let owner = self
            .ledger
            .owner_of(&chip(id))
            .cloned()
            .expect("registered animal");
        self.ledger
            .approve_vet(&owner, &chip(id), &acct(VET))
            .expect("approve vet");
        self.ledger
            .add_medical_record(&acct(VET), &chip(id), content("rabies"), RecordType::Vaccine, days)
            .expect("vaccinate");
    }
}
