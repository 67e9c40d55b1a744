//! # Vet Subcommand
//!
//! - `link`: the `--as` vet binds a license they hold.
//! - `approve`: the `--as` owner authorizes a vet for one record on one
//!   animal, valid only while the animal keeps its current owner.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use petid_core::LicenseId;

use crate::session::{Session, SessionOptions};
use crate::{parse_account, parse_animal};

/// Arguments for the `petid vet` subcommand.
#[derive(Args, Debug)]
pub struct VetArgs {
    #[command(subcommand)]
    pub command: VetCommand,
}

/// Vet subcommands.
#[derive(Subcommand, Debug)]
pub enum VetCommand {
    /// Bind the caller to a license they hold.
    Link {
        #[arg(long)]
        license: String,
    },

    /// Authorize a vet to add one record to an animal the caller owns.
    Approve {
        #[arg(long)]
        animal: String,
        #[arg(long)]
        vet: String,
    },
}

/// Execute the vet subcommand.
pub fn run_vet(args: &VetArgs, options: &SessionOptions) -> Result<u8> {
    let mut session = Session::open(options)?;
    let caller = session.caller()?;

    match &args.command {
        VetCommand::Link { license } => {
            let license_id = LicenseId::new(license)
                .with_context(|| format!("invalid license id {license:?}"))?;
            let result = session
                .ledger_mut()
                .link_vet_license(&caller, license_id.clone());
            session.commit(result, |previous| match previous {
                Some(previous) => format!("{caller} linked to {license_id} (was {previous})"),
                None => format!("{caller} linked to {license_id}"),
            })
        }
        VetCommand::Approve { animal, vet } => {
            let animal = parse_animal(animal)?;
            let vet = parse_account(vet)?;
            let result = session.ledger_mut().approve_vet(&caller, &animal, &vet);
            session.commit(result, |()| format!("{vet} may add one record to {animal}"))
        }
    }
}
