//! # Integration Tests for petid-api
//!
//! Drives the full router with `oneshot`: health probes, authentication,
//! the register → authorize → vaccinate → transfer lifecycle, error
//! mapping, handle resolution, the license directory and OpenAPI output.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use petid_api::state::{AppConfig, AppState};
use petid_core::{ManualClock, Timestamp};
use petid_ledger::LedgerConfig;

const VET: &str = "vet-1";
const OWNER: &str = "owner-1";
const BUYER: &str = "owner-2";

struct Harness {
    app: axum::Router,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn with_config(config: AppConfig) -> Self {
        let start = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let state = AppState::with_config(config, LedgerConfig::default(), clock.clone());
        Self {
            app: petid_api::app(state),
            clock,
        }
    }

    /// Send a request as `caller` (development-mode token) and decode the
    /// JSON response body, or `Value::Null` for non-JSON bodies.
    async fn send(
        &self,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header("Authorization", format!("Bearer {caller}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Issue LIC-1 to the vet and link it.
    async fn licensed_vet(&self) {
        let (status, _) = self
            .send(
                "POST",
                "/v1/licenses",
                Some("admin"),
                Some(json!({"license_id": "LIC-1", "holder": VET})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .send(
                "PUT",
                "/v1/vets/license",
                Some(VET),
                Some(json!({"license_id": "LIC-1"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Licensed vet registers `id` for OWNER, born at the harness start.
    async fn registered(&self, id: &str) {
        self.licensed_vet().await;
        let (status, body) = self
            .send(
                "POST",
                "/v1/animals",
                Some(VET),
                Some(json!({
                    "animal_id": id,
                    "owner": OWNER,
                    "birth_date": "2026-01-01T00:00:00Z",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    async fn approve_vet(&self, id: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            &format!("/v1/animals/{id}/vets"),
            Some(OWNER),
            Some(json!({"grantee": VET})),
        )
        .await
    }

    async fn add_record(&self, id: &str, record_type: &str, days_valid: u32) -> (StatusCode, Value) {
        self.send(
            "POST",
            &format!("/v1/animals/{id}/records"),
            Some(VET),
            Some(json!({
                "record_type": record_type,
                "description": "ipfs://note",
                "days_valid": days_valid,
            })),
        )
        .await
    }

    async fn transfer(&self, id: &str, caller: &str, to: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            &format!("/v1/animals/{id}/transfer"),
            Some(caller),
            Some(json!({"from": OWNER, "to": to})),
        )
        .await
    }
}

fn code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn health_probes_need_no_credentials() {
    let h = Harness::new();
    for (uri, expected) in [("/health/liveness", "ok"), ("/health/readiness", "ready")] {
        let response = h
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), expected.as_bytes());
    }
}

#[tokio::test]
async fn metrics_endpoint_is_absent_without_recorder() {
    let h = Harness::new();
    let (status, _) = h.send("GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn api_requires_bearer_token() {
    let h = Harness::new();
    let (status, body) = h.send("GET", "/v1/licenses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code(&body), "UNAUTHORIZED");
}

#[tokio::test]
async fn shared_secret_is_enforced() {
    let h = Harness::with_config(AppConfig {
        auth_token: Some("s3cret".into()),
        ..AppConfig::default()
    });
    let (status, _) = h.send("GET", "/v1/licenses", Some("owner-1:wrong"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h.send("GET", "/v1/licenses", Some("owner-1:s3cret"), None).await;
    assert_eq!(status, StatusCode::OK);
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn unlicensed_caller_cannot_register() {
    let h = Harness::new();
    let (status, body) = h
        .send(
            "POST",
            "/v1/animals",
            Some("stranger"),
            Some(json!({"animal_id": "chip-1", "owner": OWNER})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "NOT_LICENSED");
}

#[tokio::test]
async fn registered_animal_is_visible() {
    let h = Harness::new();
    h.registered("chip-1").await;

    let (status, body) = h.send("GET", "/v1/animals/chip-1", Some(OWNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], OWNER);
    assert_eq!(body["state"], "ACTIVE");
    assert_eq!(body["ownership_epoch"], 1);
    assert_eq!(body["registered_by"], VET);
    assert_eq!(body["vaccine_current"], false);

    let (status, body) = h
        .send("GET", &format!("/v1/owners/{OWNER}/animals"), Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let h = Harness::new();
    h.registered("chip-1").await;
    let (status, body) = h
        .send(
            "POST",
            "/v1/animals",
            Some(VET),
            Some(json!({"animal_id": "chip-1", "owner": BUYER})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "ALREADY_REGISTERED");
}

#[tokio::test]
async fn unknown_animal_is_not_found() {
    let h = Harness::new();
    let (status, body) = h.send("GET", "/v1/animals/ghost", Some(OWNER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code(&body), "ANIMAL_NOT_ACTIVE");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let h = Harness::new();
    h.licensed_vet().await;
    let (status, body) = h
        .send(
            "POST",
            "/v1/animals",
            Some(VET),
            Some(json!({"animal_id": " ", "owner": OWNER})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(code(&body), "VALIDATION_ERROR");
}

// -- Records ------------------------------------------------------------------

#[tokio::test]
async fn record_requires_owner_grant() {
    let h = Harness::new();
    h.registered("chip-1").await;

    let (status, body) = h.add_record("chip-1", "GENERAL", 0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "AUTHORIZATION_EXPIRED_OR_MISSING");

    let (status, body) = h.approve_vet("chip-1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["granted_at_epoch"], 1);

    let (status, body) = h.add_record("chip-1", "VACCINE", 365).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sequence"], 0);
    assert_eq!(body["record_type"], "VACCINE");

    // Single use.
    let (status, _) = h.add_record("chip-1", "GENERAL", 0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_record_type_is_rejected() {
    let h = Harness::new();
    h.registered("chip-1").await;
    h.approve_vet("chip-1").await;
    let (status, body) = h.add_record("chip-1", "ACUPUNCTURE", 0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn history_orders_both_ways() {
    let h = Harness::new();
    h.registered("chip-1").await;
    for record_type in ["GENERAL", "XRAY"] {
        h.approve_vet("chip-1").await;
        let (status, _) = h.add_record("chip-1", record_type, 0).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, asc) = h
        .send("GET", "/v1/animals/chip-1/records", Some(OWNER), None)
        .await;
    let (_, desc) = h
        .send("GET", "/v1/animals/chip-1/records?order=desc", Some(OWNER), None)
        .await;
    assert_eq!(asc["records"][0]["record_type"], "GENERAL");
    assert_eq!(asc["records"][1]["record_type"], "XRAY");
    assert_eq!(desc["records"][0]["record_type"], "XRAY");
    assert_eq!(desc["records"][1]["sequence"], 0);
}

#[tokio::test]
async fn history_of_unknown_animal_is_empty() {
    let h = Harness::new();
    let (status, body) = h
        .send("GET", "/v1/animals/ghost/records", Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], json!([]));
}

// -- Transfer -----------------------------------------------------------------

#[tokio::test]
async fn transfer_lifecycle() {
    let h = Harness::new();
    h.registered("chip-1").await;
    h.approve_vet("chip-1").await;
    h.add_record("chip-1", "VACCINE", 365).await;

    h.clock.advance_days(10);
    let (status, body) = h.transfer("chip-1", OWNER, BUYER).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "BELOW_MINIMUM_AGE");

    // A grant issued before the transfer dies with the old epoch.
    h.approve_vet("chip-1").await;

    h.clock.advance_days(51);
    let (status, body) = h.transfer("chip-1", OWNER, BUYER).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["owner"], BUYER);
    assert_eq!(body["ownership_epoch"], 2);

    let (status, body) = h.add_record("chip-1", "GENERAL", 0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "AUTHORIZATION_EXPIRED_OR_MISSING");

    let (status, _) = h.approve_vet("chip-1").await;
    assert_eq!(status, StatusCode::FORBIDDEN, "previous owner lost control");
}

#[tokio::test]
async fn transfer_without_vaccine_is_gated() {
    let h = Harness::new();
    h.registered("chip-1").await;
    h.clock.advance_days(61);
    let (status, body) = h.transfer("chip-1", OWNER, BUYER).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "VACCINATION_EXPIRED");
}

#[tokio::test]
async fn lost_animal_cannot_transfer() {
    let h = Harness::new();
    h.registered("chip-1").await;
    h.approve_vet("chip-1").await;
    h.add_record("chip-1", "VACCINE", 365).await;
    h.clock.advance_days(61);

    let (status, body) = h
        .send(
            "PUT",
            "/v1/animals/chip-1/lost",
            Some(OWNER),
            Some(json!({"lost": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_lost"], true);

    let (status, body) = h.transfer("chip-1", OWNER, BUYER).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "REPORTED_LOST");
}

#[tokio::test]
async fn operators_and_transfer_approvals() {
    let h = Harness::new();
    h.registered("chip-1").await;
    h.approve_vet("chip-1").await;
    h.add_record("chip-1", "VACCINE", 365).await;
    h.clock.advance_days(61);

    let (status, body) = h.transfer("chip-1", "broker", BUYER).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "NOT_AUTHORIZED");

    let (status, body) = h
        .send(
            "PUT",
            "/v1/operators/broker",
            Some(OWNER),
            Some(json!({"approved": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);

    let (status, _) = h.transfer("chip-1", "broker", BUYER).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn handles_resolve_to_accounts() {
    let h = Harness::new();
    let (status, body) = h
        .send(
            "PUT",
            "/v1/directory/Buyer@Example.org",
            Some(OWNER),
            Some(json!({"account": BUYER})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handle"], "buyer@example.org");

    h.registered("chip-1").await;
    h.approve_vet("chip-1").await;
    h.add_record("chip-1", "VACCINE", 365).await;
    h.clock.advance_days(61);

    let (status, body) = h.transfer("chip-1", OWNER, "buyer@example.org").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], BUYER);

    let (status, body) = h.transfer("chip-1", OWNER, "nobody@example.org").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn handle_shaped_caller_cannot_authenticate() {
    let h = Harness::new();
    h.registered("chip-1").await;

    // Once mapped, the handle names the mapped account and nobody else.
    let (status, _) = h
        .send(
            "PUT",
            "/v1/directory/dr.smith@clinic",
            Some(OWNER),
            Some(json!({"account": BUYER})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h
        .send("GET", "/v1/animals/chip-1", Some("dr.smith@clinic"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code(&body), "UNAUTHORIZED");

    let (status, body) = h
        .send(
            "PUT",
            "/v1/directory/other@clinic",
            Some(OWNER),
            Some(json!({"account": "dr.smith@clinic"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(code(&body), "VALIDATION_ERROR");
}

// -- Death --------------------------------------------------------------------

#[tokio::test]
async fn deceased_animal_is_frozen() {
    let h = Harness::new();
    h.registered("chip-1").await;

    let (status, body) = h
        .send(
            "POST",
            "/v1/animals/chip-1/decease",
            Some(VET),
            Some(json!({"certificate_ref": "ipfs://certificate"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record_type"], "DECEASED");

    let (_, body) = h.send("GET", "/v1/animals/chip-1", Some(OWNER), None).await;
    assert_eq!(body["state"], "DECEASED");
    assert_eq!(body["alive"], false);

    let (status, body) = h
        .send(
            "PUT",
            "/v1/animals/chip-1/lost",
            Some(OWNER),
            Some(json!({"lost": true})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "ANIMAL_DECEASED");
}

// -- License Directory --------------------------------------------------------

#[tokio::test]
async fn suspended_license_blocks_vet() {
    let h = Harness::new();
    h.registered("chip-1").await;
    h.approve_vet("chip-1").await;

    let (status, body) = h
        .send(
            "POST",
            "/v1/licenses/LIC-1/suspend",
            Some("admin"),
            Some(json!({"reason": "audit"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "SUSPENDED");
    assert_eq!(body["valid"], false);
    assert_eq!(body["transitions"][0]["reason"], "audit");

    let (status, body) = h.add_record("chip-1", "GENERAL", 0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "NOT_LICENSED");

    let (status, _) = h
        .send("POST", "/v1/licenses/LIC-1/reinstate", Some("admin"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.add_record("chip-1", "GENERAL", 0).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn revoked_license_is_terminal() {
    let h = Harness::new();
    h.licensed_vet().await;
    let (status, _) = h
        .send("POST", "/v1/licenses/LIC-1/revoke", Some("admin"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = h
        .send("POST", "/v1/licenses/LIC-1/reinstate", Some("admin"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "LICENSE_TRANSITION_REJECTED");
}

#[tokio::test]
async fn linking_a_foreign_license_is_forbidden() {
    let h = Harness::new();
    h.licensed_vet().await;
    let (status, _) = h
        .send(
            "PUT",
            "/v1/vets/license",
            Some("vet-2"),
            Some(json!({"license_id": "LIC-1"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .send("GET", "/v1/vets/vet-1/license", Some("anyone"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["license_id"], "LIC-1");
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn unknown_license_is_not_found() {
    let h = Harness::new();
    let (status, body) = h.send("GET", "/v1/licenses/LIC-404", Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code(&body), "LICENSE_NOT_FOUND");
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn openapi_spec_is_served() {
    let h = Harness::new();
    let (status, body) = h.send("GET", "/openapi.json", Some("anyone"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "PetID API");
    assert!(body["paths"]["/v1/animals/{animal_id}/transfer"].is_object());
}
