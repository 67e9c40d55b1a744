//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PetID API",
        version = "0.1.0",
        description = "Pet identity registry: chip-keyed animal identities, vet-authored medical records, and gated ownership transfer.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Animals
        crate::routes::animals::register_animal,
        crate::routes::animals::get_animal,
        crate::routes::animals::set_lost_status,
        crate::routes::animals::transfer_ownership,
        crate::routes::animals::approve_transfer,
        crate::routes::animals::animals_owned_by,
        // Records
        crate::routes::records::add_medical_record,
        crate::routes::records::get_history,
        crate::routes::records::report_decease,
        // Vets
        crate::routes::vets::approve_vet,
        crate::routes::vets::link_vet_license,
        crate::routes::vets::get_vet_license,
        // Operators
        crate::routes::operators::set_operator_approval,
        // Licenses
        crate::routes::licenses::issue_license,
        crate::routes::licenses::list_licenses,
        crate::routes::licenses::get_license,
        crate::routes::licenses::suspend_license,
        crate::routes::licenses::reinstate_license,
        crate::routes::licenses::revoke_license,
        crate::routes::licenses::expire_license,
        crate::routes::licenses::reassign_license,
        // Directory
        crate::routes::directory::set_handle,
        crate::routes::directory::get_handle,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Animal DTOs
        crate::routes::animals::RegisterAnimalRequest,
        crate::routes::animals::AnimalView,
        crate::routes::animals::SetLostRequest,
        crate::routes::animals::TransferRequest,
        crate::routes::animals::TransferResponse,
        crate::routes::animals::GrantRequest,
        crate::routes::animals::GrantResponse,
        // Record DTOs
        crate::routes::records::AddRecordRequest,
        crate::routes::records::DeceaseRequest,
        crate::routes::records::RecordView,
        crate::routes::records::HistoryResponse,
        crate::routes::records::Order,
        // Vet DTOs
        crate::routes::vets::LinkLicenseRequest,
        crate::routes::vets::LicenseBindingResponse,
        // Operator DTOs
        crate::routes::operators::OperatorApprovalRequest,
        crate::routes::operators::OperatorApprovalResponse,
        // License DTOs
        crate::routes::licenses::IssueLicenseRequest,
        crate::routes::licenses::TransitionRequest,
        crate::routes::licenses::ReassignLicenseRequest,
        crate::routes::licenses::TransitionView,
        crate::routes::licenses::LicenseView,
        // Directory DTOs
        crate::routes::directory::SetHandleRequest,
        crate::routes::directory::HandleView,
    )),
    tags(
        (name = "animals", description = "Animal identity and ownership"),
        (name = "records", description = "Append-only medical history"),
        (name = "vets", description = "Vet authorization and license binding"),
        (name = "operators", description = "Account-wide transfer operators"),
        (name = "licenses", description = "License directory administration"),
        (name = "directory", description = "Handle to account mapping"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
