//! # petid-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment;
//! see [`AppConfig::from_env`].

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use petid_api::state::{AppConfig, AppState};
use petid_core::SystemClock;
use petid_ledger::LedgerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();
    tracing::info!(?config, "configuration loaded");

    let ledger_config = match &config.ledger_config_path {
        Some(path) => LedgerConfig::load(path).map_err(|e| {
            tracing::error!("Ledger configuration failed: {e}");
            e
        })?,
        None => LedgerConfig::default(),
    };

    let metrics_enabled = config.metrics_enabled;
    let port = config.port;
    let mut state = AppState::with_config(config, ledger_config, Arc::new(SystemClock));
    if metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            tracing::error!("Prometheus recorder installation failed: {e}");
            e
        })?;
        state = state.with_metrics(handle);
    }

    let app = petid_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("PetID API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `PETID_LOG_FORMAT=json` switches to JSON lines; anything else is text.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("PETID_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
