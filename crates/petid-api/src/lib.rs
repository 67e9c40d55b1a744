//! # petid-api — HTTP Facade for the Pet Identity Registry
//!
//! Exposes the identity ledger over HTTP. Every call is attributed to the
//! account named in the bearer token; party fields in request bodies may
//! be account ids or directory handles, resolved before the ledger sees
//! them.
//!
//! ## API Surface
//!
//! | Prefix                          | Module                  | Domain                  |
//! |---------------------------------|-------------------------|-------------------------|
//! | `/v1/animals/*`, `/v1/owners/*` | [`routes::animals`]     | Identity and ownership  |
//! | `/v1/animals/{id}/records`      | [`routes::records`]     | Medical history         |
//! | `/v1/animals/{id}/vets`, `/v1/vets/*` | [`routes::vets`]  | Vet authorization       |
//! | `/v1/operators/*`               | [`routes::operators`]   | Transfer operators      |
//! | `/v1/licenses/*`                | [`routes::licenses`]    | License directory       |
//! | `/v1/directory/*`               | [`routes::directory`]   | Handle directory        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! `/health/*` and `/metrics` are served without credentials.

pub mod auth;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::animals::router())
        .merge(routes::records::router())
        .merge(routes::vets::router())
        .merge(routes::operators::router())
        .merge(routes::licenses::router())
        .merge(routes::directory::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(render_metrics))
        .with_state(state);

    Router::new().merge(public).merge(api)
}

/// Liveness probe. Always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}

/// Prometheus exposition, or 404 when no recorder is installed.
async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
