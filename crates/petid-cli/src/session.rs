//! # State File Session
//!
//! The CLI keeps the ledger snapshot and the license directory in one JSON
//! file. A [`Session`] rebuilds both from that file, exposes them to a
//! single subcommand, and writes them back through a temporary file and a
//! rename so an interrupted write never leaves a torn state file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use petid_core::{AccountId, Clock, FixedClock, SystemClock, Timestamp};
use petid_ledger::{IdentityLedger, LedgerConfig, LedgerError, License, LicenseRegistry, LedgerSnapshot};

use crate::report_rejection;

/// Global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// State file location.
    pub state: PathBuf,
    /// Optional YAML ledger configuration.
    pub config: Option<PathBuf>,
    /// Clock override; the system clock when absent.
    pub now: Option<Timestamp>,
    /// Account the command acts as.
    pub caller: Option<String>,
}

/// On-disk layout of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub ledger: LedgerSnapshot,
    #[serde(default)]
    pub licenses: Vec<License>,
}

impl StateFile {
    /// Read the state file. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse state file {}", path.display()))
    }

    /// Write the state file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// The ledger and license directory loaded for one command.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    caller: Option<AccountId>,
    licenses: Arc<LicenseRegistry>,
    ledger: IdentityLedger,
}

impl Session {
    /// Load the state file and rebuild the ledger over it.
    pub fn open(options: &SessionOptions) -> Result<Self> {
        let config = match &options.config {
            Some(path) => LedgerConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => LedgerConfig::default(),
        };
        let clock: Arc<dyn Clock> = match options.now {
            Some(at) => Arc::new(FixedClock::new(at)),
            None => Arc::new(SystemClock),
        };
        let caller = options
            .caller
            .as_deref()
            .map(crate::parse_account)
            .transpose()?;

        let state = StateFile::load(&options.state)?;
        let licenses = Arc::new(LicenseRegistry::from_licenses(state.licenses, clock.clone()));
        let ledger = IdentityLedger::restore(state.ledger, licenses.clone(), clock, config)
            .with_context(|| format!("state file {} is inconsistent", options.state.display()))?;

        Ok(Self {
            path: options.state.clone(),
            caller,
            licenses,
            ledger,
        })
    }

    /// The account named by `--as`.
    pub fn caller(&self) -> Result<AccountId> {
        match &self.caller {
            Some(caller) => Ok(caller.clone()),
            None => bail!("this command acts on behalf of an account; pass --as <account>"),
        }
    }

    pub fn ledger(&self) -> &IdentityLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut IdentityLedger {
        &mut self.ledger
    }

    pub fn licenses(&self) -> &LicenseRegistry {
        &self.licenses
    }

    /// Persist the current ledger and license directory.
    pub fn save(&self) -> Result<()> {
        let state = StateFile {
            ledger: self.ledger.snapshot(),
            licenses: self.licenses.list(),
        };
        state.save(&self.path)?;
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    /// Save and report success, or report the rejection and leave the
    /// state file untouched.
    pub fn commit<T>(
        &self,
        result: Result<T, LedgerError>,
        message: impl FnOnce(T) -> String,
    ) -> Result<u8> {
        match result {
            Ok(value) => {
                self.save()?;
                println!("OK: {}", message(value));
                Ok(0)
            }
            Err(err) => Ok(report_rejection(&err)),
        }
    }
}
