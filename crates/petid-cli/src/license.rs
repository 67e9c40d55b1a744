//! # License Subcommand
//!
//! Administers the local license directory. These commands do not need
//! `--as`: the directory stands in for an external registry.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use petid_core::LicenseId;
use petid_ledger::{License, LicenseError};

use crate::session::{Session, SessionOptions};
use crate::{parse_account, parse_timestamp, report_license_rejection};

/// Arguments for the `petid license` subcommand.
#[derive(Args, Debug)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

/// License subcommands.
#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Issue a new ACTIVE license.
    Issue {
        /// License identifier.
        #[arg(long)]
        id: String,
        /// Holder account.
        #[arg(long)]
        holder: String,
        /// Optional hard expiry (RFC 3339, UTC).
        #[arg(long)]
        expires_at: Option<String>,
    },

    /// Suspend an active license (ACTIVE → SUSPENDED).
    Suspend {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Reinstate a suspended license (SUSPENDED → ACTIVE).
    Reinstate {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Revoke a license permanently.
    Revoke {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Mark an active license expired.
    Expire {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Move a license to a new holder.
    Reassign {
        #[arg(long)]
        id: String,
        /// New holder account.
        #[arg(long)]
        holder: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Show one license as JSON.
    Show {
        #[arg(long)]
        id: String,
    },

    /// List all licenses.
    List,
}

/// Execute the license subcommand.
pub fn run_license(args: &LicenseArgs, options: &SessionOptions) -> Result<u8> {
    let session = Session::open(options)?;
    let registry = session.licenses();

    let result = match &args.command {
        LicenseCommand::Issue {
            id,
            holder,
            expires_at,
        } => {
            let expires_at = expires_at.as_deref().map(parse_timestamp).transpose()?;
            registry.issue(license_id(id)?, parse_account(holder)?, expires_at)
        }
        LicenseCommand::Suspend { id, reason } => registry.suspend(&license_id(id)?, reason),
        LicenseCommand::Reinstate { id, reason } => registry.reinstate(&license_id(id)?, reason),
        LicenseCommand::Revoke { id, reason } => registry.revoke(&license_id(id)?, reason),
        LicenseCommand::Expire { id, reason } => registry.expire(&license_id(id)?, reason),
        LicenseCommand::Reassign { id, holder, reason } => {
            registry.reassign(&license_id(id)?, parse_account(holder)?, reason)
        }
        LicenseCommand::Show { id } => {
            let id = license_id(id)?;
            return match registry.get(&id) {
                Some(license) => {
                    println!("{}", serde_json::to_string_pretty(&license)?);
                    Ok(0)
                }
                None => Ok(report_license_rejection(&LicenseError::NotFound(id))),
            };
        }
        LicenseCommand::List => {
            for license in registry.list() {
                println!("{}", summary(&session, &license));
            }
            return Ok(0);
        }
    };

    match result {
        Ok(license) => {
            session.save()?;
            println!("OK: {}", summary(&session, &license));
            Ok(0)
        }
        Err(err) => Ok(report_license_rejection(&err)),
    }
}

fn license_id(raw: &str) -> Result<LicenseId> {
    LicenseId::new(raw).with_context(|| format!("invalid license id {raw:?}"))
}

fn summary(session: &Session, license: &License) -> String {
    let validity = if session.licenses().is_valid(&license.license_id) {
        "valid"
    } else {
        "invalid"
    };
    format!(
        "{} held by {} is {} ({validity})",
        license.license_id, license.holder, license.state
    )
}
