//! # Handle Directory
//!
//! Translates human-friendly handles (`alice@example.org`) into account ids
//! before a request reaches the ledger. A pure key/value mapping: the
//! ledger never sees a handle. Account ids cannot contain `@`, so a party
//! string is a handle exactly when it carries one.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use petid_core::{AccountId, HANDLE_MARKER};

use crate::error::AppError;

/// Longest accepted handle.
pub const MAX_HANDLE_LEN: usize = 254;

/// Thread-safe, cloneable handle → account map.
#[derive(Debug, Clone, Default)]
pub struct HandleDirectory {
    entries: Arc<RwLock<BTreeMap<String, AccountId>>>,
}

/// Whether a party string should be looked up rather than used verbatim.
pub fn is_handle(raw: &str) -> bool {
    raw.contains(HANDLE_MARKER)
}

/// Validate and normalize a handle. Handles are case-insensitive.
pub fn normalize_handle(raw: &str) -> Result<String, AppError> {
    let handle = raw.trim();
    if !is_handle(handle) {
        return Err(AppError::Validation(format!(
            "handle {handle:?} must contain '@'"
        )));
    }
    if handle.len() > MAX_HANDLE_LEN {
        return Err(AppError::Validation(format!(
            "handle exceeds {MAX_HANDLE_LEN} bytes"
        )));
    }
    if handle.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "handle {handle:?} contains whitespace"
        )));
    }
    Ok(handle.to_lowercase())
}

impl HandleDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `handle` to `account`, returning the previous mapping.
    pub fn set(&self, handle: &str, account: AccountId) -> Result<Option<AccountId>, AppError> {
        let handle = normalize_handle(handle)?;
        Ok(self.entries.write().insert(handle, account))
    }

    /// Look up a handle.
    pub fn get(&self, handle: &str) -> Result<Option<AccountId>, AppError> {
        let handle = normalize_handle(handle)?;
        Ok(self.entries.read().get(&handle).cloned())
    }

    /// Resolve a party field: a handle is looked up, anything else must be
    /// a valid account id. An unknown handle is a validation error.
    pub fn resolve(&self, raw: &str) -> Result<AccountId, AppError> {
        if is_handle(raw) {
            self.get(raw)?
                .ok_or_else(|| AppError::Validation(format!("unknown handle {:?}", raw.trim())))
        } else {
            Ok(AccountId::new(raw)?)
        }
    }

    /// Number of mapped handles.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
