//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The ledger sits behind one `parking_lot::RwLock`. Every mutating handler
//! holds the write lock for the whole ledger call and never across an
//! `.await`, so operations apply in a single total order.

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;

use petid_core::{Clock, SystemClock};
use petid_ledger::{IdentityLedger, LedgerConfig, LicenseRegistry};

use crate::directory::HandleDirectory;

// -- Configuration ------------------------------------------------------------

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, the facade runs in development
    /// mode and trusts the account id in the token.
    pub auth_token: Option<String>,
    /// Optional YAML file with ledger business constants.
    pub ledger_config_path: Option<PathBuf>,
    /// Whether to install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("ledger_config_path", &self.ledger_config_path)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            ledger_config_path: None,
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Build configuration from `PORT`, `AUTH_TOKEN`, `PETID_CONFIG` and
    /// `PETID_METRICS_ENABLED`. Unset or unparsable values take defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            auth_token: lookup("AUTH_TOKEN").filter(|t| !t.is_empty()),
            ledger_config_path: lookup("PETID_CONFIG")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            metrics_enabled: lookup("PETID_METRICS_ENABLED")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The identity ledger.
    pub ledger: Arc<RwLock<IdentityLedger>>,
    /// In-memory license directory, also the ledger's license oracle.
    pub licenses: Arc<LicenseRegistry>,
    /// Handle → account lookup used to resolve party fields.
    pub directory: HandleDirectory,
    /// Application configuration.
    pub config: AppConfig,
    /// Prometheus render handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ledger", &*self.ledger.read())
            .field("licenses", &self.licenses)
            .field("directory", &self.directory.len())
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    /// Development state: default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), LedgerConfig::default(), Arc::new(SystemClock))
    }

    /// Build state from explicit configuration and clock.
    pub fn with_config(
        config: AppConfig,
        ledger_config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let licenses = Arc::new(LicenseRegistry::new(clock.clone()));
        let ledger = IdentityLedger::new(licenses.clone(), clock, ledger_config);
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            licenses,
            directory: HandleDirectory::new(),
            config,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_env_empty() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert!(config.metrics_enabled);
    }

    #[test]
    fn env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("PETID_CONFIG", "/etc/petid.yaml"),
            ("PETID_METRICS_ENABLED", "off"),
        ]));
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(
            config.ledger_config_path,
            Some(PathBuf::from("/etc/petid.yaml"))
        );
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "eighty"),
            ("PETID_METRICS_ENABLED", "maybe"),
            ("AUTH_TOKEN", ""),
        ]));
        assert_eq!(config.port, 8080);
        assert!(config.metrics_enabled);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("super-secret".into()),
            ..AppConfig::default()
        };
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn ledger_uses_registry_as_oracle() {
        let state = AppState::new();
        assert_eq!(state.ledger.read().animal_count(), 0);
        assert!(state.licenses.list().is_empty());
    }
}
