//! # Medical Records
//!
//! ## Endpoints
//!
//! - `POST /v1/animals/{animal_id}/records`: append a record (caller = vet
//!   holding a live owner grant)
//! - `GET /v1/animals/{animal_id}/records`: history, oldest first;
//!   `?order=desc` for newest first
//! - `POST /v1/animals/{animal_id}/decease`: report death (caller =
//!   licensed vet, no owner grant needed)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use petid_core::ContentRef;
use petid_ledger::IdentityLedger;
use petid_records::{MedicalRecord, RecordHandle, RecordType};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{animal_id, extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to append a medical record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddRecordRequest {
    /// One of GENERAL, VACCINE, SURGERY, XRAY, DECEASED.
    pub record_type: String,
    /// Opaque reference to the long-form description.
    #[serde(default)]
    pub description: String,
    /// Validity window in days. Only meaningful for VACCINE.
    #[serde(default)]
    pub days_valid: u32,
}

impl Validate for AddRecordRequest {
    fn validate(&self) -> Result<(), String> {
        self.record_type
            .parse::<RecordType>()
            .map(drop)
            .map_err(|e| e.to_string())
    }
}

/// Request to report an animal's death.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeceaseRequest {
    /// Reference to the death certificate.
    pub certificate_ref: String,
}

impl Validate for DeceaseRequest {
    fn validate(&self) -> Result<(), String> {
        if self.certificate_ref.trim().is_empty() {
            return Err("certificate_ref must not be empty".to_string());
        }
        Ok(())
    }
}

/// One medical record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordView {
    pub animal_id: String,
    /// Position in the animal's history (0 = oldest).
    pub sequence: u64,
    pub timestamp: String,
    pub vet: String,
    pub record_type: String,
    pub description: String,
    pub days_valid: u32,
}

impl From<&MedicalRecord> for RecordView {
    fn from(r: &MedicalRecord) -> Self {
        Self {
            animal_id: r.animal_id.to_string(),
            sequence: r.sequence,
            timestamp: r.timestamp.to_iso8601(),
            vet: r.vet.to_string(),
            record_type: r.record_type.to_string(),
            description: r.description.to_string(),
            days_valid: r.days_valid,
        }
    }
}

/// An animal's history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub animal_id: String,
    pub records: Vec<RecordView>,
}

/// History ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// `asc` (default) or `desc`.
    #[serde(default)]
    pub order: Order,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the records router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/animals/{animal_id}/records",
            post(add_medical_record).get(get_history),
        )
        .route("/v1/animals/{animal_id}/decease", post(report_decease))
}

fn record_view(ledger: &IdentityLedger, handle: &RecordHandle) -> Result<RecordView, AppError> {
    ledger
        .record(handle)
        .map(RecordView::from)
        .ok_or_else(|| AppError::Internal(format!("record {handle} missing after append")))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/animals/{animal_id}/records — Append a medical record.
#[utoipa::path(
    post,
    path = "/v1/animals/{animal_id}/records",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    request_body = AddRecordRequest,
    responses(
        (status = 201, description = "Record appended", body = RecordView),
        (status = 403, description = "Unlicensed vet or no live authorization", body = crate::error::ErrorBody),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
        (status = 409, description = "Animal deceased", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "records"
)]
pub async fn add_medical_record(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
    body: Result<Json<AddRecordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    let id = animal_id(&raw_id)?;
    let req = extract_validated_json(body)?;
    let record_type: RecordType = req.record_type.parse()?;
    let description = ContentRef::new(req.description)?;

    let mut ledger = state.ledger.write();
    let handle =
        ledger.add_medical_record(&caller.account, &id, description, record_type, req.days_valid)?;
    Ok((StatusCode::CREATED, Json(record_view(&ledger, &handle)?)))
}

/// GET /v1/animals/{animal_id}/records — Medical history.
#[utoipa::path(
    get,
    path = "/v1/animals/{animal_id}/records",
    params(
        ("animal_id" = String, Path, description = "Chip identifier"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "History, empty for an unknown animal", body = HistoryResponse),
    ),
    tag = "records"
)]
pub async fn get_history(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let id = animal_id(&raw_id)?;
    let ledger = state.ledger.read();
    let history = ledger.history(&id);
    let records = match query.order {
        Order::Asc => history.map(RecordView::from).collect(),
        Order::Desc => history.rev().map(RecordView::from).collect(),
    };
    Ok(Json(HistoryResponse {
        animal_id: id.to_string(),
        records,
    }))
}

/// POST /v1/animals/{animal_id}/decease — Report an animal's death.
#[utoipa::path(
    post,
    path = "/v1/animals/{animal_id}/decease",
    params(("animal_id" = String, Path, description = "Chip identifier")),
    request_body = DeceaseRequest,
    responses(
        (status = 201, description = "Death recorded", body = RecordView),
        (status = 403, description = "Caller is not a licensed vet", body = crate::error::ErrorBody),
        (status = 404, description = "Animal not registered", body = crate::error::ErrorBody),
        (status = 409, description = "Animal already deceased", body = crate::error::ErrorBody),
    ),
    tag = "records"
)]
pub async fn report_decease(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
    body: Result<Json<DeceaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    let id = animal_id(&raw_id)?;
    let req = extract_validated_json(body)?;
    let certificate_ref = ContentRef::new(req.certificate_ref)?;

    let mut ledger = state.ledger.write();
    let handle = ledger.report_decease(&caller.account, &id, certificate_ref)?;
    Ok((StatusCode::CREATED, Json(record_view(&ledger, &handle)?)))
}
