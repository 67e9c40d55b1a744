//! # License Lifecycle and In-Memory Directory
//!
//! Stand-in for the external veterinary license directory. The ledger only
//! sees it through [`LicenseOracle`]; the API and CLI use the richer
//! [`LicenseRegistry`] surface to issue and manage licenses.
//!
//! ## States
//!
//! ```text
//! Active ──▶ Suspended ──▶ Active (reinstatement)
//!   │            │
//!   │            └──▶ Revoked (terminal)
//!   ├──▶ Revoked (terminal)
//!   └──▶ Expired (terminal)
//! ```
//!
//! An `Active` license with an `expires_at` in the past also reports
//! invalid, without needing an explicit `expire` transition.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use petid_core::{AccountId, Clock, LicenseId, Timestamp};

use crate::directory::{DirectoryError, LicenseOracle};

// ─── License State ───────────────────────────────────────────────────

/// The lifecycle state of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseState {
    /// License is in good standing.
    Active,
    /// License is temporarily suspended.
    Suspended,
    /// License has been permanently revoked (terminal).
    Revoked,
    /// License has expired (terminal).
    Expired,
}

impl LicenseState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked | Self::Expired)
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Revoked => "REVOKED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for LicenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from license registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LicenseError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid license transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: LicenseState,
        /// Attempted target state.
        to: LicenseState,
    },

    /// License is in a terminal state.
    #[error("license is in terminal state {0}")]
    TerminalState(LicenseState),

    /// No such license.
    #[error("license {0} not found")]
    NotFound(LicenseId),

    /// A license with this id already exists.
    #[error("license {0} already exists")]
    AlreadyExists(LicenseId),
}

// ─── Transition Records ──────────────────────────────────────────────

/// Record of a license state or holder change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTransitionRecord {
    /// State before the change.
    pub from_state: LicenseState,
    /// State after the change.
    pub to_state: LicenseState,
    /// When the change occurred.
    pub timestamp: Timestamp,
    /// Free-text reason.
    pub reason: String,
}

// ─── License ─────────────────────────────────────────────────────────

/// A veterinary license and its transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Directory identifier.
    pub license_id: LicenseId,
    /// Current holder.
    pub holder: AccountId,
    /// Current lifecycle state.
    pub state: LicenseState,
    /// When the license was issued.
    pub issued_at: Timestamp,
    /// Optional hard expiry.
    pub expires_at: Option<Timestamp>,
    /// Ordered log of transitions.
    pub transitions: Vec<LicenseTransitionRecord>,
}

impl License {
    /// Issue a new, active license.
    pub fn issue(
        license_id: LicenseId,
        holder: AccountId,
        expires_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        Self {
            license_id,
            holder,
            state: LicenseState::Active,
            issued_at: now,
            expires_at,
            transitions: Vec::new(),
        }
    }

    /// Whether the license is valid at `now`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.state == LicenseState::Active && self.expires_at.map_or(true, |exp| now < exp)
    }

    /// ACTIVE → SUSPENDED.
    pub fn suspend(&mut self, reason: &str, now: Timestamp) -> Result<(), LicenseError> {
        self.require_state(LicenseState::Active, LicenseState::Suspended)?;
        self.do_transition(LicenseState::Suspended, reason, now);
        Ok(())
    }

    /// SUSPENDED → ACTIVE.
    pub fn reinstate(&mut self, reason: &str, now: Timestamp) -> Result<(), LicenseError> {
        self.require_state(LicenseState::Suspended, LicenseState::Active)?;
        self.do_transition(LicenseState::Active, reason, now);
        Ok(())
    }

    /// ACTIVE or SUSPENDED → REVOKED.
    pub fn revoke(&mut self, reason: &str, now: Timestamp) -> Result<(), LicenseError> {
        if self.state.is_terminal() {
            return Err(LicenseError::TerminalState(self.state));
        }
        self.do_transition(LicenseState::Revoked, reason, now);
        Ok(())
    }

    /// ACTIVE → EXPIRED.
    pub fn expire(&mut self, reason: &str, now: Timestamp) -> Result<(), LicenseError> {
        self.require_state(LicenseState::Active, LicenseState::Expired)?;
        self.do_transition(LicenseState::Expired, reason, now);
        Ok(())
    }

    /// Hand the license to a new holder. The state is unchanged; terminal
    /// licenses cannot be reassigned.
    pub fn reassign(
        &mut self,
        holder: AccountId,
        reason: &str,
        now: Timestamp,
    ) -> Result<(), LicenseError> {
        if self.state.is_terminal() {
            return Err(LicenseError::TerminalState(self.state));
        }
        self.holder = holder;
        self.do_transition(self.state, reason, now);
        Ok(())
    }

    fn require_state(&self, expected: LicenseState, target: LicenseState) -> Result<(), LicenseError> {
        if self.state.is_terminal() {
            return Err(LicenseError::TerminalState(self.state));
        }
        if self.state != expected {
            return Err(LicenseError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: LicenseState, reason: &str, now: Timestamp) {
        self.transitions.push(LicenseTransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: now,
            reason: reason.to_string(),
        });
        self.state = to;
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Thread-safe in-memory license directory.
///
/// Validity is evaluated against the injected clock on every query.
pub struct LicenseRegistry {
    licenses: RwLock<BTreeMap<LicenseId, License>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LicenseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseRegistry")
            .field("licenses", &self.licenses.read().len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl LicenseRegistry {
    /// Create an empty registry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_licenses(Vec::new(), clock)
    }

    /// Rebuild a registry from previously exported licenses.
    pub fn from_licenses(licenses: Vec<License>, clock: Arc<dyn Clock>) -> Self {
        let licenses = licenses
            .into_iter()
            .map(|l| (l.license_id.clone(), l))
            .collect();
        Self {
            licenses: RwLock::new(licenses),
            clock,
        }
    }

    /// Issue a new active license to `holder`.
    pub fn issue(
        &self,
        license_id: LicenseId,
        holder: AccountId,
        expires_at: Option<Timestamp>,
    ) -> Result<License, LicenseError> {
        let mut licenses = self.licenses.write();
        if licenses.contains_key(&license_id) {
            return Err(LicenseError::AlreadyExists(license_id));
        }
        let license = License::issue(license_id.clone(), holder, expires_at, self.clock.now());
        licenses.insert(license_id, license.clone());
        tracing::info!(license = %license.license_id, holder = %license.holder, "license issued");
        Ok(license)
    }

    /// Suspend an active license.
    pub fn suspend(&self, license_id: &LicenseId, reason: &str) -> Result<License, LicenseError> {
        self.modify(license_id, |l, now| l.suspend(reason, now))
    }

    /// Reinstate a suspended license.
    pub fn reinstate(&self, license_id: &LicenseId, reason: &str) -> Result<License, LicenseError> {
        self.modify(license_id, |l, now| l.reinstate(reason, now))
    }

    /// Revoke a license permanently.
    pub fn revoke(&self, license_id: &LicenseId, reason: &str) -> Result<License, LicenseError> {
        self.modify(license_id, |l, now| l.revoke(reason, now))
    }

    /// Mark an active license expired.
    pub fn expire(&self, license_id: &LicenseId, reason: &str) -> Result<License, LicenseError> {
        self.modify(license_id, |l, now| l.expire(reason, now))
    }

    /// Move a license to a new holder.
    pub fn reassign(
        &self,
        license_id: &LicenseId,
        holder: AccountId,
        reason: &str,
    ) -> Result<License, LicenseError> {
        self.modify(license_id, |l, now| l.reassign(holder, reason, now))
    }

    /// Look up a license.
    pub fn get(&self, license_id: &LicenseId) -> Option<License> {
        self.licenses.read().get(license_id).cloned()
    }

    /// All licenses, ordered by id.
    pub fn list(&self) -> Vec<License> {
        self.licenses.read().values().cloned().collect()
    }

    /// Whether the license is valid right now.
    pub fn is_valid(&self, license_id: &LicenseId) -> bool {
        let now = self.clock.now();
        self.licenses
            .read()
            .get(license_id)
            .is_some_and(|l| l.is_valid_at(now))
    }

    fn modify(
        &self,
        license_id: &LicenseId,
        f: impl FnOnce(&mut License, Timestamp) -> Result<(), LicenseError>,
    ) -> Result<License, LicenseError> {
        let now = self.clock.now();
        let mut licenses = self.licenses.write();
        let license = licenses
            .get_mut(license_id)
            .ok_or_else(|| LicenseError::NotFound(license_id.clone()))?;
        f(license, now)?;
        tracing::info!(license = %license_id, state = %license.state, "license updated");
        Ok(license.clone())
    }
}

impl LicenseOracle for LicenseRegistry {
    fn is_license_valid(&self, license_id: &LicenseId) -> Result<bool, DirectoryError> {
        let now = self.clock.now();
        self.licenses
            .read()
            .get(license_id)
            .map(|l| l.is_valid_at(now))
            .ok_or_else(|| DirectoryError::NotFound(license_id.clone()))
    }

    fn license_owner(&self, license_id: &LicenseId) -> Result<AccountId, DirectoryError> {
        self.licenses
            .read()
            .get(license_id)
            .map(|l| l.holder.clone())
            .ok_or_else(|| DirectoryError::NotFound(license_id.clone()))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
