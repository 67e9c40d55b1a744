//! # Veterinarians — Licenses and Owner Grants
//!
//! ## Endpoints
//!
//! - `POST /v1/animals/{animal_id}/vets`: owner grants a vet one write
//! - `PUT /v1/vets/license`: the caller binds their own license
//! - `GET /v1/vets/{vet}/license`: a vet's current binding

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use petid_core::{AccountId, LicenseId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{animal_id, extract_validated_json, Validate};
use crate::routes::animals::{view, GrantRequest, GrantResponse};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to bind the caller to a license.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkLicenseRequest {
    pub license_id: String,
}

impl Validate for LinkLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        if self.license_id.trim().is_empty() {
            return Err("license_id must not be empty".to_string());
        }
        Ok(())
    }
}

/// A vet's license binding.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseBindingResponse {
    pub vet: String,
    pub license_id: String,
    /// Binding replaced by this call, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// Whether the directory currently reports the license valid.
    pub valid: bool,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the vets router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/animals/{animal_id}/vets", post(approve_vet))
        .route("/v1/vets/license", put(link_vet_license))
        .route("/v1/vets/{vet}/license", get(get_vet_license))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/animals/{animal_id}/vets — Authorize a vet for one record.
#[utoipa::path(
    post,
    path = "/v1/animals/{animal_id}/vets",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    request_body = GrantRequest,
    responses(
        (status = 201, description = "Vet authorized", body = GrantResponse),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
        (status = 409, description = "Animal deceased", body = crate::error::ErrorBody),
    ),
    tag = "vets"
)]
pub async fn approve_vet(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
    body: Result<Json<GrantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GrantResponse>), AppError> {
    let id = animal_id(&raw_id)?;
    let req = extract_validated_json(body)?;
    let vet = state.directory.resolve(&req.grantee)?;

    let mut ledger = state.ledger.write();
    ledger.approve_vet(&caller.account, &id, &vet)?;
    let epoch = view(&ledger, &id)?.ownership_epoch;
    Ok((
        StatusCode::CREATED,
        Json(GrantResponse {
            animal_id: id.to_string(),
            grantee: vet.to_string(),
            granted_at_epoch: epoch,
        }),
    ))
}

/// PUT /v1/vets/license — Bind the caller to a license they hold.
#[utoipa::path(
    put,
    path = "/v1/vets/license",
    request_body = LinkLicenseRequest,
    responses(
        (status = 200, description = "License linked", body = LicenseBindingResponse),
        (status = 403, description = "Caller does not hold a valid license", body = crate::error::ErrorBody),
    ),
    tag = "vets"
)]
pub async fn link_vet_license(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<LinkLicenseRequest>, JsonRejection>,
) -> Result<Json<LicenseBindingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let license_id = LicenseId::new(&req.license_id)?;

    let previous = state
        .ledger
        .write()
        .link_vet_license(&caller.account, license_id.clone())?;
    Ok(Json(LicenseBindingResponse {
        vet: caller.account.to_string(),
        valid: state.licenses.is_valid(&license_id),
        license_id: license_id.to_string(),
        previous: previous.map(|l| l.to_string()),
    }))
}

/// GET /v1/vets/{vet}/license — A vet's current license binding.
#[utoipa::path(
    get,
    path = "/v1/vets/{vet}/license",
    params(("vet" = String, Path, description = "Vet account id or handle")),
    responses(
        (status = 200, description = "Current binding", body = LicenseBindingResponse),
        (status = 404, description = "No license linked", body = crate::error::ErrorBody),
    ),
    tag = "vets"
)]
pub async fn get_vet_license(
    State(state): State<AppState>,
    Path(raw_vet): Path<String>,
) -> Result<Json<LicenseBindingResponse>, AppError> {
    let vet: AccountId = state.directory.resolve(&raw_vet)?;
    let license_id = state
        .ledger
        .read()
        .linked_license(&vet)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("vet {vet} has no linked license")))?;
    Ok(Json(LicenseBindingResponse {
        vet: vet.to_string(),
        valid: state.licenses.is_valid(&license_id),
        license_id: license_id.to_string(),
        previous: None,
    }))
}
