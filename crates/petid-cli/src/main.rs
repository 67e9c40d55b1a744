//! # petid CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use petid_cli::animal::{run_animal, AnimalArgs};
use petid_cli::license::{run_license, LicenseArgs};
use petid_cli::record::{run_record, RecordArgs};
use petid_cli::vet::{run_vet, VetArgs};
use petid_cli::{parse_timestamp, SessionOptions, DEFAULT_STATE_PATH};

/// PetID registry CLI
///
/// Operates the pet identity ledger against a local JSON state file.
#[derive(Parser, Debug)]
#[command(name = "petid", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the state file.
    #[arg(long, global = true, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Path to the ledger configuration (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate the command at this instant instead of the system time
    /// (RFC 3339, UTC).
    #[arg(long, global = true)]
    now: Option<String>,

    /// Account the command acts as.
    #[arg(long = "as", global = true)]
    caller: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// License directory administration.
    License(LicenseArgs),

    /// License binding and owner-issued vet authorization.
    Vet(VetArgs),

    /// Animal registration, lookup and ownership.
    Animal(AnimalArgs),

    /// Medical records and history.
    Record(RecordArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = parse_timestamp_arg(cli.now.as_deref()).and_then(|now| {
        let options = SessionOptions {
            state: cli.state,
            config: cli.config,
            now,
            caller: cli.caller,
        };
        tracing::debug!(state = %options.state.display(), "petid CLI starting");

        match &cli.command {
            Commands::License(args) => run_license(args, &options),
            Commands::Vet(args) => run_vet(args, &options),
            Commands::Animal(args) => run_animal(args, &options),
            Commands::Record(args) => run_record(args, &options),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("ERROR: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn parse_timestamp_arg(raw: Option<&str>) -> anyhow::Result<Option<petid_core::Timestamp>> {
    raw.map(parse_timestamp).transpose()
}
