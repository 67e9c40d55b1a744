//! End-to-end CLI flows against a temporary state file. Each call reopens
//! the state file, exactly as separate `petid` invocations would.

use std::path::{Path, PathBuf};

use petid_cli::animal::{run_animal, AnimalArgs, AnimalCommand};
use petid_cli::license::{run_license, LicenseArgs, LicenseCommand};
use petid_cli::record::{run_record, RecordArgs, RecordCommand};
use petid_cli::vet::{run_vet, VetArgs, VetCommand};
use petid_cli::{parse_timestamp, SessionOptions, StateFile, EXIT_REJECTED};

const CHIP: &str = "985112000000001";

fn options(state: &Path, caller: Option<&str>, day: u32) -> SessionOptions {
    SessionOptions {
        state: state.to_path_buf(),
        config: None,
        now: Some(
            parse_timestamp("2026-01-01T00:00:00Z")
                .unwrap()
                .plus_days(day),
        ),
        caller: caller.map(str::to_string),
    }
}

fn license(state: &Path, command: LicenseCommand) -> u8 {
    run_license(&LicenseArgs { command }, &options(state, None, 0)).unwrap()
}

fn vet(state: &Path, caller: &str, day: u32, command: VetCommand) -> u8 {
    run_vet(&VetArgs { command }, &options(state, Some(caller), day)).unwrap()
}

fn animal(state: &Path, caller: &str, day: u32, command: AnimalCommand) -> u8 {
    run_animal(&AnimalArgs { command }, &options(state, Some(caller), day)).unwrap()
}

fn record(state: &Path, caller: &str, day: u32, command: RecordCommand) -> u8 {
    run_record(&RecordArgs { command }, &options(state, Some(caller), day)).unwrap()
}

/// Licensed vet-1, CHIP registered to alice, born on day 0.
fn setup() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join(".petid").join("state.json");
    assert_eq!(
        license(
            &state,
            LicenseCommand::Issue {
                id: "LIC-1".into(),
                holder: "vet-1".into(),
                expires_at: None,
            }
        ),
        0
    );
    assert_eq!(
        vet(&state, "vet-1", 0, VetCommand::Link { license: "LIC-1".into() }),
        0
    );
    assert_eq!(
        animal(
            &state,
            "vet-1",
            0,
            AnimalCommand::Register {
                id: CHIP.into(),
                owner: "alice".into(),
                metadata: "ipfs://profile".into(),
                birth_date: Some("2026-01-01T00:00:00Z".into()),
            }
        ),
        0
    );
    (dir, state)
}

fn vaccinate(state: &Path, day: u32) {
    assert_eq!(
        vet(
            state,
            "alice",
            day,
            VetCommand::Approve {
                animal: CHIP.into(),
                vet: "vet-1".into(),
            }
        ),
        0
    );
    assert_eq!(
        record(
            state,
            "vet-1",
            day,
            RecordCommand::Add {
                animal: CHIP.into(),
                record_type: "VACCINE".into(),
                description: "ipfs://rabies".into(),
                days_valid: 365,
            }
        ),
        0
    );
}

fn transfer(state: &Path, caller: &str, day: u32, to: &str) -> u8 {
    animal(
        state,
        caller,
        day,
        AnimalCommand::Transfer {
            id: CHIP.into(),
            from: "alice".into(),
            to: to.into(),
        },
    )
}

fn snapshot(state: &Path) -> StateFile {
    StateFile::load(state).unwrap()
}

#[test]
fn registration_persists_across_invocations() {
    let (_dir, state) = setup();
    let file = snapshot(&state);
    assert_eq!(file.licenses.len(), 1);
    assert_eq!(file.ledger.animals.len(), 1);
    assert_eq!(
        file.ledger.license_bindings.values().next().map(|l| l.as_str()),
        Some("LIC-1")
    );
}

#[test]
fn transfer_respects_minimum_age_and_epoch() {
    let (_dir, state) = setup();
    vaccinate(&state, 0);

    assert_eq!(transfer(&state, "alice", 10, "bob"), EXIT_REJECTED);
    assert_eq!(transfer(&state, "alice", 61, "bob"), 0);

    let file = snapshot(&state);
    let row = file.ledger.animals.values().next().unwrap();
    assert_eq!(row.owner.as_str(), "bob");
    assert_eq!(row.ownership_epoch, 2);
}

#[test]
fn rejected_command_leaves_state_file_unchanged() {
    let (_dir, state) = setup();
    let before = std::fs::read(&state).unwrap();
    assert_eq!(transfer(&state, "alice", 61, "bob"), EXIT_REJECTED);
    assert_eq!(std::fs::read(&state).unwrap(), before);
}

#[test]
fn owner_grant_dies_with_transfer() {
    let (_dir, state) = setup();
    vaccinate(&state, 0);
    assert_eq!(
        vet(
            &state,
            "alice",
            30,
            VetCommand::Approve {
                animal: CHIP.into(),
                vet: "vet-1".into(),
            }
        ),
        0
    );
    assert_eq!(transfer(&state, "alice", 61, "bob"), 0);
    assert_eq!(
        record(
            &state,
            "vet-1",
            62,
            RecordCommand::Add {
                animal: CHIP.into(),
                record_type: "GENERAL".into(),
                description: String::new(),
                days_valid: 0,
            }
        ),
        EXIT_REJECTED
    );
}

#[test]
fn operator_transfers_on_owners_behalf() {
    let (_dir, state) = setup();
    vaccinate(&state, 0);
    assert_eq!(transfer(&state, "broker", 61, "bob"), EXIT_REJECTED);
    assert_eq!(
        animal(
            &state,
            "alice",
            61,
            AnimalCommand::Operator {
                operator: "broker".into(),
                revoke: false,
            }
        ),
        0
    );
    assert_eq!(transfer(&state, "broker", 61, "bob"), 0);
}

#[test]
fn lost_animal_cannot_be_transferred_until_found() {
    let (_dir, state) = setup();
    vaccinate(&state, 0);
    let lost = |found| AnimalCommand::Lost {
        id: CHIP.into(),
        found,
    };
    assert_eq!(animal(&state, "alice", 61, lost(false)), 0);
    assert_eq!(transfer(&state, "alice", 61, "bob"), EXIT_REJECTED);
    assert_eq!(animal(&state, "alice", 61, lost(true)), 0);
    assert_eq!(transfer(&state, "alice", 61, "bob"), 0);
}

#[test]
fn suspended_license_blocks_registration() {
    let (_dir, state) = setup();
    assert_eq!(
        license(
            &state,
            LicenseCommand::Suspend {
                id: "LIC-1".into(),
                reason: "audit".into(),
            }
        ),
        0
    );
    assert_eq!(
        animal(
            &state,
            "vet-1",
            1,
            AnimalCommand::Register {
                id: "985112000000002".into(),
                owner: "alice".into(),
                metadata: String::new(),
                birth_date: None,
            }
        ),
        EXIT_REJECTED
    );
    assert_eq!(
        license(
            &state,
            LicenseCommand::Revoke {
                id: "LIC-1".into(),
                reason: String::new(),
            }
        ),
        0
    );
    assert_eq!(
        license(
            &state,
            LicenseCommand::Reinstate {
                id: "LIC-1".into(),
                reason: String::new(),
            }
        ),
        EXIT_REJECTED
    );
}

#[test]
fn death_freezes_the_animal() {
    let (_dir, state) = setup();
    assert_eq!(
        record(
            &state,
            "vet-1",
            5,
            RecordCommand::Decease {
                animal: CHIP.into(),
                certificate: "ipfs://certificate".into(),
            }
        ),
        0
    );
    assert_eq!(
        vet(
            &state,
            "alice",
            6,
            VetCommand::Approve {
                animal: CHIP.into(),
                vet: "vet-1".into(),
            }
        ),
        EXIT_REJECTED
    );
    let file = snapshot(&state);
    assert!(!file.ledger.animals.values().next().unwrap().alive);
}

#[test]
fn commands_acting_for_an_account_need_caller() {
    let (_dir, state) = setup();
    let args = VetArgs {
        command: VetCommand::Link {
            license: "LIC-1".into(),
        },
    };
    assert!(run_vet(&args, &options(&state, None, 0)).is_err());
}
