//! # License Directory Administration
//!
//! An in-process stand-in for the external professional-license
//! directory. The ledger only ever reads it through `LicenseOracle`; these
//! endpoints let operators issue licenses and drive their lifecycle.
//!
//! ## Endpoints
//!
//! - `POST /v1/licenses`: issue
//! - `GET /v1/licenses`: list
//! - `GET /v1/licenses/{license_id}`: detail with transition history
//! - `POST /v1/licenses/{license_id}/{suspend,reinstate,revoke,expire}`
//! - `POST /v1/licenses/{license_id}/reassign`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use petid_core::LicenseId;
use petid_ledger::{License, LicenseError, LicenseRegistry};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, optional_timestamp, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to issue a license.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueLicenseRequest {
    pub license_id: String,
    /// Holder account id or directory handle.
    pub holder: String,
    /// Optional hard expiry, RFC 3339 UTC.
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl Validate for IssueLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        if self.license_id.trim().is_empty() {
            return Err("license_id must not be empty".to_string());
        }
        if self.holder.trim().is_empty() {
            return Err("holder must not be empty".to_string());
        }
        Ok(())
    }
}

/// Optional free-text reason attached to a transition.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TransitionRequest {
    #[serde(default)]
    pub reason: String,
}

/// Request to move a license to a new holder.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReassignLicenseRequest {
    pub holder: String,
    #[serde(default)]
    pub reason: String,
}

impl Validate for ReassignLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        if self.holder.trim().is_empty() {
            return Err("holder must not be empty".to_string());
        }
        Ok(())
    }
}

/// One lifecycle transition.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionView {
    pub from_state: String,
    pub to_state: String,
    pub timestamp: String,
    pub reason: String,
}

/// License detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseView {
    pub license_id: String,
    pub holder: String,
    /// `ACTIVE`, `SUSPENDED`, `REVOKED` or `EXPIRED`.
    pub state: String,
    /// Whether the license passes the validity check right now.
    pub valid: bool,
    pub issued_at: String,
    pub expires_at: Option<String>,
    pub transitions: Vec<TransitionView>,
}

impl LicenseView {
    fn build(registry: &LicenseRegistry, license: &License) -> Self {
        Self {
            license_id: license.license_id.to_string(),
            holder: license.holder.to_string(),
            state: license.state.to_string(),
            valid: registry.is_valid(&license.license_id),
            issued_at: license.issued_at.to_iso8601(),
            expires_at: license.expires_at.map(|t| t.to_iso8601()),
            transitions: license
                .transitions
                .iter()
                .map(|t| TransitionView {
                    from_state: t.from_state.to_string(),
                    to_state: t.to_state.to_string(),
                    timestamp: t.timestamp.to_iso8601(),
                    reason: t.reason.clone(),
                })
                .collect(),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the licenses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/licenses", post(issue_license).get(list_licenses))
        .route("/v1/licenses/{license_id}", get(get_license))
        .route("/v1/licenses/{license_id}/suspend", post(suspend_license))
        .route("/v1/licenses/{license_id}/reinstate", post(reinstate_license))
        .route("/v1/licenses/{license_id}/revoke", post(revoke_license))
        .route("/v1/licenses/{license_id}/expire", post(expire_license))
        .route("/v1/licenses/{license_id}/reassign", post(reassign_license))
}

fn license_id(raw: &str) -> Result<LicenseId, AppError> {
    Ok(LicenseId::new(raw)?)
}

/// A request without a JSON body carries an empty reason.
fn reason(body: Option<Json<TransitionRequest>>) -> String {
    body.map(|Json(req)| req.reason).unwrap_or_default()
}

fn transition(
    state: &AppState,
    raw_id: &str,
    apply: impl FnOnce(&LicenseRegistry, &LicenseId) -> Result<License, LicenseError>,
) -> Result<Json<LicenseView>, AppError> {
    let id = license_id(raw_id)?;
    let license = apply(&state.licenses, &id)?;
    Ok(Json(LicenseView::build(&state.licenses, &license)))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/licenses — Issue a license.
#[utoipa::path(
    post,
    path = "/v1/licenses",
    request_body = IssueLicenseRequest,
    responses(
        (status = 201, description = "License issued", body = LicenseView),
        (status = 409, description = "License id already issued", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn issue_license(
    State(state): State<AppState>,
    body: Result<Json<IssueLicenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LicenseView>), AppError> {
    let req = extract_validated_json(body)?;
    let id = license_id(&req.license_id)?;
    let holder = state.directory.resolve(&req.holder)?;
    let expires_at = optional_timestamp(req.expires_at.as_deref())?;

    let license = state.licenses.issue(id, holder, expires_at)?;
    Ok((
        StatusCode::CREATED,
        Json(LicenseView::build(&state.licenses, &license)),
    ))
}

/// GET /v1/licenses — All licenses, ordered by id.
#[utoipa::path(
    get,
    path = "/v1/licenses",
    responses(
        (status = 200, description = "Licenses", body = Vec<LicenseView>),
    ),
    tag = "licenses"
)]
pub async fn list_licenses(State(state): State<AppState>) -> Json<Vec<LicenseView>> {
    Json(
        state
            .licenses
            .list()
            .iter()
            .map(|l| LicenseView::build(&state.licenses, l))
            .collect(),
    )
}

/// GET /v1/licenses/{license_id} — License detail.
#[utoipa::path(
    get,
    path = "/v1/licenses/{license_id}",
    params(("license_id" = String, Path, description = "License identifier")),
    responses(
        (status = 200, description = "License found", body = LicenseView),
        (status = 404, description = "License not found", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn get_license(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<LicenseView>, AppError> {
    let id = license_id(&raw_id)?;
    let license = state
        .licenses
        .get(&id)
        .ok_or(LicenseError::NotFound(id))?;
    Ok(Json(LicenseView::build(&state.licenses, &license)))
}

/// POST /v1/licenses/{license_id}/suspend — ACTIVE → SUSPENDED.
#[utoipa::path(
    post,
    path = "/v1/licenses/{license_id}/suspend",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body(content = TransitionRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "License suspended", body = LicenseView),
        (status = 404, description = "License not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn suspend_license(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<LicenseView>, AppError> {
    let reason = reason(body);
    transition(&state, &raw_id, |r, id| r.suspend(id, &reason))
}

/// POST /v1/licenses/{license_id}/reinstate — SUSPENDED → ACTIVE.
#[utoipa::path(
    post,
    path = "/v1/licenses/{license_id}/reinstate",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body(content = TransitionRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "License reinstated", body = LicenseView),
        (status = 404, description = "License not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn reinstate_license(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<LicenseView>, AppError> {
    let reason = reason(body);
    transition(&state, &raw_id, |r, id| r.reinstate(id, &reason))
}

/// POST /v1/licenses/{license_id}/revoke — Permanent revocation.
#[utoipa::path(
    post,
    path = "/v1/licenses/{license_id}/revoke",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body(content = TransitionRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "License revoked", body = LicenseView),
        (status = 404, description = "License not found", body = crate::error::ErrorBody),
        (status = 409, description = "License already terminal", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn revoke_license(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<LicenseView>, AppError> {
    let reason = reason(body);
    transition(&state, &raw_id, |r, id| r.revoke(id, &reason))
}

/// POST /v1/licenses/{license_id}/expire — ACTIVE → EXPIRED.
#[utoipa::path(
    post,
    path = "/v1/licenses/{license_id}/expire",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body(content = TransitionRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "License expired", body = LicenseView),
        (status = 404, description = "License not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn expire_license(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<LicenseView>, AppError> {
    let reason = reason(body);
    transition(&state, &raw_id, |r, id| r.expire(id, &reason))
}

/// POST /v1/licenses/{license_id}/reassign — Move a license to a new holder.
#[utoipa::path(
    post,
    path = "/v1/licenses/{license_id}/reassign",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body = ReassignLicenseRequest,
    responses(
        (status = 200, description = "License reassigned", body = LicenseView),
        (status = 404, description = "License not found", body = crate::error::ErrorBody),
        (status = 409, description = "License already terminal", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn reassign_license(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<ReassignLicenseRequest>, JsonRejection>,
) -> Result<Json<LicenseView>, AppError> {
    let req = extract_validated_json(body)?;
    let holder = state.directory.resolve(&req.holder)?;
    transition(&state, &raw_id, |r, id| r.reassign(id, holder, &req.reason))
}
