//! # Animals — Identity and Ownership
//!
//! ## Endpoints
//!
//! - `POST /v1/animals`: register an animal (caller = licensed vet)
//! - `GET /v1/animals/{animal_id}`: animal view
//! - `PUT /v1/animals/{animal_id}/lost`: set or clear the lost flag (owner)
//! - `POST /v1/animals/{animal_id}/transfer`: transfer ownership
//! - `POST /v1/animals/{animal_id}/transfer-approvals`: approve a one-off
//!   transfer operator (owner)
//! - `GET /v1/owners/{owner}/animals`: animals held by an owner

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use petid_core::{AnimalId, ContentRef};
use petid_ledger::{AnimalIdentity, IdentityLedger, LedgerError};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{animal_id, extract_validated_json, optional_timestamp, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to register a new animal.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterAnimalRequest {
    /// Chip identifier.
    pub animal_id: String,
    /// Owner account id or directory handle.
    pub owner: String,
    /// Opaque reference to externally stored metadata.
    #[serde(default)]
    pub metadata_ref: Option<String>,
    /// Birth date, RFC 3339 UTC.
    #[serde(default)]
    pub birth_date: Option<String>,
}

impl Validate for RegisterAnimalRequest {
    fn validate(&self) -> Result<(), String> {
        if self.animal_id.trim().is_empty() {
            return Err("animal_id must not be empty".to_string());
        }
        if self.owner.trim().is_empty() {
            return Err("owner must not be empty".to_string());
        }
        Ok(())
    }
}

/// Public view of an animal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnimalView {
    pub animal_id: String,
    pub owner: String,
    pub metadata_ref: String,
    /// `ACTIVE` or `DECEASED`.
    pub state: String,
    pub is_lost: bool,
    pub ownership_epoch: u64,
    pub alive: bool,
    pub birth_date: Option<String>,
    pub vaccine_expires_at: Option<String>,
    pub vaccine_current: bool,
    pub registered_at: String,
    pub registered_by: String,
    pub record_count: usize,
}

impl AnimalView {
    /// Assemble the view from the ledger row and its derived facts.
    pub fn build(ledger: &IdentityLedger, animal: &AnimalIdentity) -> Self {
        let id = &animal.animal_id;
        Self {
            animal_id: id.to_string(),
            owner: animal.owner.to_string(),
            metadata_ref: animal.metadata_ref.to_string(),
            state: animal.state().to_string(),
            is_lost: animal.is_lost,
            ownership_epoch: animal.ownership_epoch,
            alive: animal.alive,
            birth_date: ledger.birth_date(id).map(|t| t.to_iso8601()),
            vaccine_expires_at: ledger.vaccine_expires_at(id).map(|t| t.to_iso8601()),
            vaccine_current: ledger.is_vaccine_current(id),
            registered_at: animal.registered_at.to_iso8601(),
            registered_by: animal.registered_by.to_string(),
            record_count: ledger.history(id).len(),
        }
    }
}

/// Request to set the lost flag.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetLostRequest {
    pub lost: bool,
}

impl Validate for SetLostRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request to transfer ownership.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Current owner (account id or handle).
    pub from: String,
    /// New owner (account id or handle).
    pub to: String,
}

impl Validate for TransferRequest {
    fn validate(&self) -> Result<(), String> {
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Err("from and to must not be empty".to_string());
        }
        Ok(())
    }
}

/// Result of a completed transfer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    pub animal_id: String,
    pub owner: String,
    pub ownership_epoch: u64,
}

/// Request naming a grantee (vet or transfer operator).
#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantRequest {
    /// Grantee account id or handle.
    pub grantee: String,
}

impl Validate for GrantRequest {
    fn validate(&self) -> Result<(), String> {
        if self.grantee.trim().is_empty() {
            return Err("grantee must not be empty".to_string());
        }
        Ok(())
    }
}

/// An epoch-scoped grant that was just issued.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantResponse {
    pub animal_id: String,
    pub grantee: String,
    /// The grant is live only while the animal stays at this epoch.
    pub granted_at_epoch: u64,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the animals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/animals", post(register_animal))
        .route("/v1/animals/{animal_id}", get(get_animal))
        .route("/v1/animals/{animal_id}/lost", put(set_lost_status))
        .route("/v1/animals/{animal_id}/transfer", post(transfer_ownership))
        .route(
            "/v1/animals/{animal_id}/transfer-approvals",
            post(approve_transfer),
        )
        .route("/v1/owners/{owner}/animals", get(animals_owned_by))
}

/// Look up an animal the caller just operated on.
pub(crate) fn view(ledger: &IdentityLedger, id: &AnimalId) -> Result<AnimalView, AppError> {
    ledger
        .animal(id)
        .map(|animal| AnimalView::build(ledger, animal))
        .ok_or_else(|| LedgerError::AnimalNotActive(id.clone()).into())
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/animals — Register a new animal.
#[utoipa::path(
    post,
    path = "/v1/animals",
    request_body = RegisterAnimalRequest,
    responses(
        (status = 201, description = "Animal registered", body = AnimalView),
        (status = 403, description = "Caller is not a licensed vet", body = crate::error::ErrorBody),
        (status = 409, description = "Animal id already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "animals"
)]
pub async fn register_animal(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterAnimalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnimalView>), AppError> {
    let req = extract_validated_json(body)?;
    let id = AnimalId::new(&req.animal_id)?;
    let owner = state.directory.resolve(&req.owner)?;
    let metadata_ref = match req.metadata_ref {
        Some(raw) => ContentRef::new(raw)?,
        None => ContentRef::empty(),
    };
    let birth_date = optional_timestamp(req.birth_date.as_deref())?;

    let mut ledger = state.ledger.write();
    ledger.register_animal(&caller.account, owner, id.clone(), metadata_ref, birth_date)?;
    Ok((StatusCode::CREATED, Json(view(&ledger, &id)?)))
}

/// GET /v1/animals/{animal_id} — Get an animal.
#[utoipa::path(
    get,
    path = "/v1/animals/{animal_id}",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    responses(
        (status = 200, description = "Animal found", body = AnimalView),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
    ),
    tag = "animals"
)]
pub async fn get_animal(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<AnimalView>, AppError> {
    let id = animal_id(&raw_id)?;
    let ledger = state.ledger.read();
    Ok(Json(view(&ledger, &id)?))
}

/// PUT /v1/animals/{animal_id}/lost — Set or clear the lost flag.
#[utoipa::path(
    put,
    path = "/v1/animals/{animal_id}/lost",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    request_body = SetLostRequest,
    responses(
        (status = 200, description = "Lost flag updated", body = AnimalView),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
        (status = 409, description = "Animal deceased", body = crate::error::ErrorBody),
    ),
    tag = "animals"
)]
pub async fn set_lost_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
    body: Result<Json<SetLostRequest>, JsonRejection>,
) -> Result<Json<AnimalView>, AppError> {
    let id = animal_id(&raw_id)?;
    let req = extract_validated_json(body)?;

    let mut ledger = state.ledger.write();
    ledger.set_lost_status(&caller.account, &id, req.lost)?;
    Ok(Json(view(&ledger, &id)?))
}

/// POST /v1/animals/{animal_id}/transfer — Transfer ownership.
#[utoipa::path(
    post,
    path = "/v1/animals/{animal_id}/transfer",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Ownership transferred", body = TransferResponse),
        (status = 403, description = "Caller may not transfer", body = crate::error::ErrorBody),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
        (status = 409, description = "Transfer gate failed or animal deceased", body = crate::error::ErrorBody),
    ),
    tag = "animals"
)]
pub async fn transfer_ownership(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let id = animal_id(&raw_id)?;
    let req = extract_validated_json(body)?;
    let from = state.directory.resolve(&req.from)?;
    let to = state.directory.resolve(&req.to)?;

    let mut ledger = state.ledger.write();
    let epoch = ledger.transfer_ownership(&caller.account, &id, &from, to.clone())?;
    Ok(Json(TransferResponse {
        animal_id: id.to_string(),
        owner: to.to_string(),
        ownership_epoch: epoch,
    }))
}

/// POST /v1/animals/{animal_id}/transfer-approvals — Approve a transfer operator.
#[utoipa::path(
    post,
    path = "/v1/animals/{animal_id}/transfer-approvals",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    request_body = GrantRequest,
    responses(
        (status = 201, description = "Transfer approved", body = GrantResponse),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
    ),
    tag = "animals"
)]
pub async fn approve_transfer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
    body: Result<Json<GrantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GrantResponse>), AppError> {
    let id = animal_id(&raw_id)?;
    let req = extract_validated_json(body)?;
    let operator = state.directory.resolve(&req.grantee)?;

    let mut ledger = state.ledger.write();
    ledger.approve_transfer(&caller.account, &id, &operator)?;
    let epoch = view(&ledger, &id)?.ownership_epoch;
    Ok((
        StatusCode::CREATED,
        Json(GrantResponse {
            animal_id: id.to_string(),
            grantee: operator.to_string(),
            granted_at_epoch: epoch,
        }),
    ))
}

/// GET /v1/owners/{owner}/animals — Animals currently held by an owner.
#[utoipa::path(
    get,
    path = "/v1/owners/{owner}/animals",
    params(("owner" = String, Path, description = "Owner account id or handle")),
    responses(
        (status = 200, description = "Owned animals", body = Vec<AnimalView>),
        (status = 422, description = "Unknown handle", body = crate::error::ErrorBody),
    ),
    tag = "animals"
)]
pub async fn animals_owned_by(
    State(state): State<AppState>,
    Path(raw_owner): Path<String>,
) -> Result<Json<Vec<AnimalView>>, AppError> {
    let owner = state.directory.resolve(&raw_owner)?;
    let ledger = state.ledger.read();
    let animals = ledger
        .animals_owned_by(&owner)
        .map(|animal| AnimalView::build(&ledger, animal))
        .collect();
    Ok(Json(animals))
}
