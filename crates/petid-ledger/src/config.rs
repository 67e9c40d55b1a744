//! # Ledger Configuration
//!
//! Tunable business constants, loaded from YAML:
//!
//! ```yaml
//! min_transfer_age_days: 60
//! ```
//!
//! Missing keys take their defaults. Unknown keys are rejected so a typo
//! cannot silently fall back to a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum age, in days, before an animal may change owner.
pub const DEFAULT_MIN_TRANSFER_AGE_DAYS: u32 = 60;

/// Upper bound accepted for `min_transfer_age_days` (ten years).
pub const MAX_MIN_TRANSFER_AGE_DAYS: u32 = 3650;

/// Errors loading or validating a [`LedgerConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML was malformed or had unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value was out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Business constants for the identity ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// An animal with a recorded birth date may not be transferred until
    /// this many days after birth.
    pub min_transfer_age_days: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_transfer_age_days: DEFAULT_MIN_TRANSFER_AGE_DAYS,
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_transfer_age_days > MAX_MIN_TRANSFER_AGE_DAYS {
            return Err(ConfigError::Invalid(format!(
                "min_transfer_age_days must be at most {MAX_MIN_TRANSFER_AGE_DAYS}, got {}",
                self.min_transfer_age_days
            )));
        }
        Ok(())
    }
}
