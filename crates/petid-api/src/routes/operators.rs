//! # Operators — Account-Wide Transfer Approval
//!
//! `PUT /v1/operators/{operator}` lets the caller approve or revoke an
//! operator for every animal they own, now or later.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to set an operator approval.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OperatorApprovalRequest {
    pub approved: bool,
}

impl Validate for OperatorApprovalRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Resulting operator approval.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OperatorApprovalResponse {
    pub owner: String,
    pub operator: String,
    pub approved: bool,
}

/// Build the operators router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/operators/{operator}", put(set_operator_approval))
}

/// PUT /v1/operators/{operator} — Approve or revoke an account-wide operator.
#[utoipa::path(
    put,
    path = "/v1/operators/{operator}",
    params(("operator" = String, Path, description = "Operator account id or handle")),
    request_body = OperatorApprovalRequest,
    responses(
        (status = 200, description = "Approval updated", body = OperatorApprovalResponse),
        (status = 422, description = "Unknown handle", body = crate::error::ErrorBody),
    ),
    tag = "operators"
)]
pub async fn set_operator_approval(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_operator): Path<String>,
    body: Result<Json<OperatorApprovalRequest>, JsonRejection>,
) -> Result<Json<OperatorApprovalResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let operator = state.directory.resolve(&raw_operator)?;

    let mut ledger = state.ledger.write();
    ledger.set_operator_approval(&caller.account, &operator, req.approved);
    Ok(Json(OperatorApprovalResponse {
        owner: caller.account.to_string(),
        operator: operator.to_string(),
        approved: ledger.is_operator(&caller.account, &operator),
    }))
}
