//! # Record Subcommand
//!
//! - `add`: the `--as` vet appends a record, consuming the owner's grant.
//! - `decease`: the `--as` vet reports a death; no owner grant needed.
//! - `history`: print an animal's records, oldest first unless `--desc`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use petid_core::ContentRef;
use petid_records::{MedicalRecord, RecordType};

use crate::parse_animal;
use crate::session::{Session, SessionOptions};

/// Arguments for the `petid record` subcommand.
#[derive(Args, Debug)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommand,
}

/// Record subcommands.
#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// Append a medical record.
    Add {
        #[arg(long)]
        animal: String,
        /// GENERAL, VACCINE, SURGERY or XRAY.
        #[arg(long = "type")]
        record_type: String,
        /// Reference to the long-form description.
        #[arg(long, default_value = "")]
        description: String,
        /// Validity window in days (VACCINE only).
        #[arg(long, default_value_t = 0)]
        days_valid: u32,
    },

    /// Report an animal's death.
    Decease {
        #[arg(long)]
        animal: String,
        /// Reference to the death certificate.
        #[arg(long)]
        certificate: String,
    },

    /// Print an animal's medical history.
    History {
        #[arg(long)]
        animal: String,
        /// Newest first.
        #[arg(long)]
        desc: bool,
    },
}

/// Execute the record subcommand.
pub fn run_record(args: &RecordArgs, options: &SessionOptions) -> Result<u8> {
    let mut session = Session::open(options)?;

    match &args.command {
        RecordCommand::Add {
            animal,
            record_type,
            description,
            days_valid,
        } => {
            let vet = session.caller()?;
            let animal = parse_animal(animal)?;
            let record_type: RecordType = record_type
                .parse()
                .with_context(|| format!("invalid record type {record_type:?}"))?;
            let description = ContentRef::new(description.as_str())?;
            let result = session.ledger_mut().add_medical_record(
                &vet,
                &animal,
                description,
                record_type,
                *days_valid,
            );
            session.commit(result, |handle| format!("appended {record_type} record {handle}"))
        }

        RecordCommand::Decease {
            animal,
            certificate,
        } => {
            let vet = session.caller()?;
            let animal = parse_animal(animal)?;
            let certificate = ContentRef::new(certificate.as_str())?;
            let result = session
                .ledger_mut()
                .report_decease(&vet, &animal, certificate);
            session.commit(result, |handle| format!("{animal} reported deceased ({handle})"))
        }

        RecordCommand::History { animal, desc } => {
            let animal = parse_animal(animal)?;
            let history = session.ledger().history(&animal);
            if *desc {
                history.rev().for_each(print_record);
            } else {
                history.for_each(print_record);
            }
            Ok(0)
        }
    }
}

fn print_record(record: &MedicalRecord) {
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        record.sequence,
        record.timestamp,
        record.record_type,
        record.vet,
        record.days_valid,
        record.description
    );
}
