//! # Handle Directory
//!
//! `PUT /v1/directory/{handle}` maps a handle to an account id;
//! `GET /v1/directory/{handle}` looks it up.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use petid_core::AccountId;

use crate::directory::normalize_handle;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to map a handle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetHandleRequest {
    pub account: String,
}

impl Validate for SetHandleRequest {
    fn validate(&self) -> Result<(), String> {
        if self.account.trim().is_empty() {
            return Err("account must not be empty".to_string());
        }
        Ok(())
    }
}

/// A handle mapping.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HandleView {
    /// Normalized (lower-case) handle.
    pub handle: String,
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// Build the directory router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/directory/{handle}", get(get_handle).put(set_handle))
}

/// PUT /v1/directory/{handle} — Map a handle to an account.
#[utoipa::path(
    put,
    path = "/v1/directory/{handle}",
    params(("handle" = String, Path, description = "Handle, must contain '@'")),
    request_body = SetHandleRequest,
    responses(
        (status = 200, description = "Handle mapped", body = HandleView),
        (status = 422, description = "Malformed handle or account", body = crate::error::ErrorBody),
    ),
    tag = "directory"
)]
pub async fn set_handle(
    State(state): State<AppState>,
    Path(raw_handle): Path<String>,
    body: Result<Json<SetHandleRequest>, JsonRejection>,
) -> Result<Json<HandleView>, AppError> {
    let req = extract_validated_json(body)?;
    let handle = normalize_handle(&raw_handle)?;
    let account = AccountId::new(&req.account)?;

    let previous = state.directory.set(&handle, account.clone())?;
    tracing::info!(%handle, %account, "handle mapped");
    Ok(Json(HandleView {
        handle,
        account: account.to_string(),
        previous: previous.map(|a| a.to_string()),
    }))
}

/// GET /v1/directory/{handle} — Look up a handle.
#[utoipa::path(
    get,
    path = "/v1/directory/{handle}",
    params(("handle" = String, Path, description = "Handle, must contain '@'")),
    responses(
        (status = 200, description = "Handle found", body = HandleView),
        (status = 404, description = "Handle not mapped", body = crate::error::ErrorBody),
    ),
    tag = "directory"
)]
pub async fn get_handle(
    State(state): State<AppState>,
    Path(raw_handle): Path<String>,
) -> Result<Json<HandleView>, AppError> {
    let handle = normalize_handle(&raw_handle)?;
    let account = state
        .directory
        .get(&handle)?
        .ok_or_else(|| AppError::NotFound(format!("handle {handle} not mapped")))?;
    Ok(Json(HandleView {
        handle,
        account: account.to_string(),
        previous: None,
    }))
}
