//! # Animal Subcommand
//!
//! Registration, lookup and ownership operations. Every mutating command
//! acts as the `--as` account.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use petid_core::ContentRef;

use crate::session::{Session, SessionOptions};
use crate::{parse_account, parse_animal, parse_timestamp};

/// Arguments for the `petid animal` subcommand.
#[derive(Args, Debug)]
pub struct AnimalArgs {
    #[command(subcommand)]
    pub command: AnimalCommand,
}

/// Animal subcommands.
#[derive(Subcommand, Debug)]
pub enum AnimalCommand {
    /// Register a new animal (caller must be a licensed vet).
    Register {
        /// Chip identifier.
        #[arg(long)]
        id: String,
        /// Initial owner account.
        #[arg(long)]
        owner: String,
        /// Reference to externally stored metadata.
        #[arg(long, default_value = "")]
        metadata: String,
        /// Birth date (RFC 3339, UTC).
        #[arg(long)]
        birth_date: Option<String>,
    },

    /// Show an animal and its derived facts as JSON.
    Show {
        #[arg(long)]
        id: String,
    },

    /// Report an animal lost, or found with `--found`.
    Lost {
        #[arg(long)]
        id: String,
        /// Clear the lost flag instead of setting it.
        #[arg(long)]
        found: bool,
    },

    /// Transfer ownership.
    Transfer {
        #[arg(long)]
        id: String,
        /// Current owner.
        #[arg(long)]
        from: String,
        /// New owner.
        #[arg(long)]
        to: String,
    },

    /// Allow an operator to transfer one animal once.
    ApproveTransfer {
        #[arg(long)]
        id: String,
        #[arg(long)]
        operator: String,
    },

    /// Approve (or with `--revoke`, withdraw) an operator for every
    /// animal the caller owns.
    Operator {
        #[arg(long)]
        operator: String,
        #[arg(long)]
        revoke: bool,
    },

    /// List the animals an owner holds.
    Owned {
        #[arg(long)]
        owner: String,
    },
}

/// Execute the animal subcommand.
pub fn run_animal(args: &AnimalArgs, options: &SessionOptions) -> Result<u8> {
    let mut session = Session::open(options)?;

    match &args.command {
        AnimalCommand::Register {
            id,
            owner,
            metadata,
            birth_date,
        } => {
            let caller = session.caller()?;
            let id = parse_animal(id)?;
            let owner = parse_account(owner)?;
            let metadata = ContentRef::new(metadata.as_str())?;
            let birth_date = birth_date.as_deref().map(parse_timestamp).transpose()?;
            let result =
                session
                    .ledger_mut()
                    .register_animal(&caller, owner.clone(), id, metadata, birth_date);
            session.commit(result, |id| format!("registered {id} to {owner}"))
        }

        AnimalCommand::Show { id } => cmd_show(&session, id),

        AnimalCommand::Lost { id, found } => {
            let caller = session.caller()?;
            let id = parse_animal(id)?;
            let result = session.ledger_mut().set_lost_status(&caller, &id, !found);
            let status = if *found { "found" } else { "lost" };
            session.commit(result, |()| format!("{id} reported {status}"))
        }

        AnimalCommand::Transfer { id, from, to } => {
            let caller = session.caller()?;
            let id = parse_animal(id)?;
            let from = parse_account(from)?;
            let to = parse_account(to)?;
            let result = session
                .ledger_mut()
                .transfer_ownership(&caller, &id, &from, to.clone());
            session.commit(result, |epoch| {
                format!("{id} transferred from {from} to {to} (epoch {epoch})")
            })
        }

        AnimalCommand::ApproveTransfer { id, operator } => {
            let caller = session.caller()?;
            let id = parse_animal(id)?;
            let operator = parse_account(operator)?;
            let result = session.ledger_mut().approve_transfer(&caller, &id, &operator);
            session.commit(result, |()| format!("{operator} may transfer {id} once"))
        }

        AnimalCommand::Operator { operator, revoke } => {
            let caller = session.caller()?;
            let operator = parse_account(operator)?;
            session
                .ledger_mut()
                .set_operator_approval(&caller, &operator, !revoke);
            let verb = if *revoke { "revoked" } else { "approved" };
            session.commit(Ok(()), |()| format!("operator {operator} {verb} for {caller}"))
        }

        AnimalCommand::Owned { owner } => {
            let owner = parse_account(owner)?;
            for animal in session.ledger().animals_owned_by(&owner) {
                println!(
                    "{}\tepoch {}\t{}",
                    animal.animal_id,
                    animal.ownership_epoch,
                    animal.state()
                );
            }
            Ok(0)
        }
    }
}

fn cmd_show(session: &Session, raw_id: &str) -> Result<u8> {
    let id = parse_animal(raw_id)?;
    let ledger = session.ledger();
    let Some(animal) = ledger.animal(&id) else {
        eprintln!("NOT FOUND: animal {id} is not registered");
        return Ok(crate::EXIT_REJECTED);
    };
    let view = json!({
        "animal": animal,
        "state": animal.state(),
        "birth_date": ledger.birth_date(&id),
        "vaccine_expires_at": ledger.vaccine_expires_at(&id),
        "vaccine_current": ledger.is_vaccine_current(&id),
        "record_count": ledger.history(&id).len(),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(0)
}
