//! End-to-end tests of the HTTP API over in-memory ports

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use interface_api::auth::{create_token, permissions};
use interface_api::config::{ApiConfig, StorageBackend};
use interface_api::{create_router, AppState};
use test_utils::SAMPLE_ENROLLEE_CSV;

const SECRET: &str = "api-test-secret";

fn config() -> ApiConfig {
    ApiConfig {
        jwt_secret: SECRET.to_string(),
        storage: StorageBackend::Memory,
        ..ApiConfig::default()
    }
}

fn server() -> TestServer {
    TestServer::new(create_router(AppState::in_memory(config()))).unwrap()
}

fn bearer(user: &str, roles: &[&str]) -> HeaderValue {
    let roles = roles.iter().map(|r| r.to_string()).collect();
    let token = create_token(user, roles, SECRET, 300).unwrap();
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn admin() -> HeaderValue {
    bearer("admin", &[permissions::ADMIN])
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

async fn register(server: &TestServer, first: &str, last: &str, nhia: &str, plan: &str) -> Value {
    let response = server
        .post("/api/v1/enrollees")
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({
            "first_name": first,
            "last_name": last,
            "date_of_birth": "1990-04-12",
            "gender": "female",
            "nhia_number": nhia,
            "plan": plan,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

async fn create_provider(server: &TestServer, name: &str) -> Value {
    let response = server
        .post("/api/v1/providers")
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({
            "name": name,
            "tier": "secondary",
            "category": "hospital",
            "contract_start": (today() - Duration::days(30)).to_string(),
            "contract_end": (today() + Duration::days(335)).to_string(),
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

async fn submit_claim(server: &TestServer, enrollee: &Value, provider: &Value) -> Value {
    let response = server
        .post("/api/v1/claims")
        .add_header(header::AUTHORIZATION, bearer("portal", &[permissions::CLAIM_SUBMIT]))
        .json(&json!({
            "enrollee_id": enrollee["id"],
            "provider_id": provider["id"],
            "diagnosis_codes": ["b54"],
            "encounter_date": today().to_string(),
            "treatments": [
                {
                    "service_type": "consultation",
                    "description": "GP consultation",
                    "quantity": 1,
                    "unit_price": "5000"
                },
                {
                    "service_type": "laboratory",
                    "description": "Malaria parasite test",
                    "quantity": 2,
                    "unit_price": "2500"
                }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

/// Takes a submitted claim through both vetting stages to approval
async fn approve_claim(server: &TestServer, claim_id: &str) -> Value {
    let vetter = bearer("vetter-1", &[permissions::CLAIM_VET]);
    let doctor = bearer("dr-okafor", &[permissions::CLAIM_REVIEW, permissions::CLAIM_APPROVE]);

    for (path, auth) in [
        ("pick", vetter.clone()),
        ("forward", vetter),
        ("pick", doctor.clone()),
        ("approve", doctor),
    ] {
        let response = server
            .post(&format!("/api/v1/claims/{}/vetting/{}", claim_id, path))
            .add_header(header::AUTHORIZATION, auth)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK, "vetting step {}", path);
    }

    server
        .get(&format!("/api/v1/claims/{}", claim_id))
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>()
}

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let server = server();

    let health = server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "healthy");

    let ready = server.get("/health/ready").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
    let body = ready.json::<Value>();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let server = server();
    let response = server.get("/api/v1/enrollees").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "unauthorized");

    let response = server
        .get("/api/v1/enrollees")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_role_is_forbidden() {
    let server = server();
    let response = server
        .post("/api/v1/enrollees")
        .add_header(header::AUTHORIZATION, bearer("vetter-1", &[permissions::CLAIM_VET]))
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Obi",
            "date_of_birth": "1990-04-12"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_endpoint_checks_credentials() {
    let server = server();

    let refused = server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .await;
    assert_eq!(refused.status_code(), StatusCode::UNAUTHORIZED);

    let issued = server
        .post("/api/v1/auth/token")
        .json(&json!({
            "username": "admin",
            "password": "admin",
            "roles": [permissions::ENROLLMENT_WRITE]
        }))
        .await;
    assert_eq!(issued.status_code(), StatusCode::OK);
    let body = issued.json::<Value>();
    assert_eq!(body["token_type"], "Bearer");

    let token = body["access_token"].as_str().unwrap();
    let listed = server
        .get("/api/v1/enrollees")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
        .await;
    assert_eq!(listed.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_and_duplicate_nhia() {
    let server = server();
    let enrollee = register(&server, "Amaka", "Obi", "NH-7781", "gold").await;
    assert_eq!(enrollee["status"], "active");
    assert_eq!(enrollee["plan"], "gold");
    assert_eq!(enrollee["full_name"], "Amaka Obi");

    let duplicate = server
        .post("/api/v1/enrollees")
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({
            "first_name": "Someone",
            "last_name": "Else",
            "date_of_birth": "1985-01-01",
            "nhia_number": "nh-7781"
        }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let fetched = server
        .get(&format!("/api/v1/enrollees/{}", enrollee["id"].as_str().unwrap()))
        .add_header(header::AUTHORIZATION, admin())
        .await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.json::<Value>()["enrollee_number"], enrollee["enrollee_number"]);
}

#[tokio::test]
async fn test_registration_problems_are_listed() {
    let server = server();
    let response = server
        .post("/api/v1/enrollees")
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({
            "first_name": "",
            "last_name": "Obi",
            "date_of_birth": "2090-01-01",
            "email": "not-an-email"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let details = response.json::<Value>()["details"].as_array().unwrap().len();
    assert!(details >= 3);
}

#[tokio::test]
async fn test_csv_upload_reports_bad_rows() {
    let server = server();
    let response = server
        .post("/api/v1/enrollees/upload")
        .add_header(header::AUTHORIZATION, admin())
        .text(SAMPLE_ENROLLEE_CSV)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let report = response.json::<Value>();
    assert_eq!(report["total_rows"], 4);
    assert_eq!(report["accepted"].as_array().unwrap().len(), 2);
    let lines: Vec<u64> = report["rejected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["line"].as_u64().unwrap())
        .collect();
    assert_eq!(lines, vec![4, 5]);

    let employer = server
        .get("/api/v1/enrollees")
        .add_query_param("employer", "zenith bank")
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>();
    assert_eq!(employer.as_array().unwrap().len(), 2);

    let empty = server
        .post("/api/v1/enrollees/upload")
        .add_header(header::AUTHORIZATION, admin())
        .text("   ")
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_eligibility_follows_status() {
    let server = server();
    let enrollee = register(&server, "Tunde", "Bello", "NH-3001", "bronze").await;
    let id = enrollee["id"].as_str().unwrap();

    let dental = server
        .get(&format!("/api/v1/enrollees/{}/eligibility", id))
        .add_query_param("service", "dental")
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>();
    assert_eq!(dental["eligible"], false);

    let suspended = server
        .post(&format!("/api/v1/enrollees/{}/status", id))
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({ "status": "suspended" }))
        .await;
    assert_eq!(suspended.status_code(), StatusCode::OK);

    let consultation = server
        .get(&format!("/api/v1/enrollees/{}/eligibility", id))
        .add_query_param("service", "consultation")
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>();
    assert_eq!(consultation["eligible"], false);
}

#[tokio::test]
async fn test_provider_lifecycle() {
    let server = server();
    let provider = create_provider(&server, "Reddington Hospital").await;
    assert_eq!(provider["status"], "active");
    assert!(provider["provider_code"].as_str().unwrap().starts_with("PRV-S-"));
    let id = provider["id"].as_str().unwrap();

    let shorter = server
        .post(&format!("/api/v1/providers/{}/renew", id))
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({ "contract_end": today().to_string() }))
        .await;
    assert_eq!(shorter.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let renewed = server
        .post(&format!("/api/v1/providers/{}/renew", id))
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({ "contract_end": (today() + Duration::days(700)).to_string() }))
        .await;
    assert_eq!(renewed.status_code(), StatusCode::OK);
    assert_eq!(renewed.json::<Value>()["days_to_contract_expiry"], 700);
}

#[tokio::test]
async fn test_prior_authorization_is_single_use() {
    let server = server();
    let enrollee = register(&server, "Chiamaka", "Eze", "NH-4001", "gold").await;
    let provider = create_provider(&server, "Lagoon Hospital").await;

    let issued = server
        .post("/api/v1/authorizations")
        .add_header(header::AUTHORIZATION, bearer("desk", &[permissions::CLAIM_SUBMIT]))
        .json(&json!({
            "enrollee_id": enrollee["id"],
            "provider_id": provider["id"],
            "diagnosis_code": "J06.9",
            "services": ["consultation", "pharmacy"]
        }))
        .await;
    assert_eq!(issued.status_code(), StatusCode::CREATED);
    let pa = issued.json::<Value>();
    let code = pa["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("PA-"));
    assert_eq!(pa["status"], "active");

    let claim_body = json!({
        "enrollee_id": enrollee["id"],
        "provider_id": provider["id"],
        "pa_code": code,
        "diagnosis_codes": ["J06.9"],
        "encounter_date": today().to_string(),
        "treatments": [{
            "service_type": "consultation",
            "description": "Specialist consultation",
            "quantity": 1,
            "unit_price": "8000"
        }]
    });
    let submitter = bearer("portal", &[permissions::CLAIM_SUBMIT]);

    let first = server
        .post("/api/v1/claims")
        .add_header(header::AUTHORIZATION, submitter.clone())
        .json(&claim_body)
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    assert_eq!(first.json::<Value>()["pa_code"], code.as_str());

    let used = server
        .get(&format!("/api/v1/authorizations/{}", code))
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>();
    assert_eq!(used["status"], "used");

    let second = server
        .post("/api/v1/claims")
        .add_header(header::AUTHORIZATION, submitter)
        .json(&claim_body)
        .await;
    assert_eq!(second.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_vetting_flow_with_line_correction() {
    let server = server();
    let enrollee = register(&server, "Musa", "Danjuma", "NH-5001", "silver").await;
    let provider = create_provider(&server, "Garki Hospital").await;
    let claim = submit_claim(&server, &enrollee, &provider).await;
    let id = claim["id"].as_str().unwrap().to_string();

    assert_eq!(claim["stage"], "ready_for_initial_vetting");
    assert_eq!(decimal(&claim["submitted_amount"]), dec!(10000));
    assert_eq!(claim["diagnosis_codes"][0], "B54");

    let vetter = bearer("vetter-1", &[permissions::CLAIM_VET]);
    let picked = server
        .post(&format!("/api/v1/claims/{}/vetting/pick", id))
        .add_header(header::AUTHORIZATION, vetter.clone())
        .await
        .json::<Value>();
    assert_eq!(picked["stage"], "under_initial_vetting");
    assert_eq!(picked["assigned_to"], "vetter-1");

    // Another vetter cannot act on a claim they do not hold
    let intruder = server
        .post(&format!("/api/v1/claims/{}/vetting/forward", id))
        .add_header(header::AUTHORIZATION, bearer("vetter-2", &[permissions::CLAIM_VET]))
        .await;
    assert_eq!(intruder.status_code(), StatusCode::FORBIDDEN);

    let line_id = picked["treatments"][1]["id"].as_str().unwrap().to_string();
    let corrected = server
        .put(&format!("/api/v1/claims/{}/treatments/{}", id, line_id))
        .add_header(header::AUTHORIZATION, vetter.clone())
        .json(&json!({ "quantity": 1 }))
        .await;
    assert_eq!(corrected.status_code(), StatusCode::OK);
    assert_eq!(decimal(&corrected.json::<Value>()["submitted_amount"]), dec!(7500));

    let forwarded = server
        .post(&format!("/api/v1/claims/{}/vetting/forward", id))
        .add_header(header::AUTHORIZATION, vetter)
        .json(&json!({ "note": "single test is enough" }))
        .await;
    assert_eq!(forwarded.status_code(), StatusCode::OK);
    assert_eq!(forwarded.json::<Value>()["stage"], "pending_doctor_review");

    // Doctor review queue needs the review role
    let wrong_queue = server
        .post(&format!("/api/v1/claims/{}/vetting/pick", id))
        .add_header(header::AUTHORIZATION, bearer("vetter-1", &[permissions::CLAIM_VET]))
        .await;
    assert_eq!(wrong_queue.status_code(), StatusCode::FORBIDDEN);

    let doctor = bearer("dr-okafor", &[permissions::CLAIM_REVIEW, permissions::CLAIM_APPROVE]);
    let review = server
        .post(&format!("/api/v1/claims/{}/vetting/pick", id))
        .add_header(header::AUTHORIZATION, doctor.clone())
        .await;
    assert_eq!(review.status_code(), StatusCode::OK);

    let consultation_line = picked["treatments"][0]["id"].as_str().unwrap().to_string();
    let approved = server
        .post(&format!("/api/v1/claims/{}/vetting/approve", id))
        .add_header(header::AUTHORIZATION, doctor)
        .json(&json!({ "lines": [{ "line_id": consultation_line, "amount": "4000" }] }))
        .await;
    assert_eq!(approved.status_code(), StatusCode::OK);
    let approved = approved.json::<Value>();
    assert_eq!(approved["stage"], "approved");
    assert_eq!(decimal(&approved["approved_amount"]), dec!(6500));
    assert_eq!(approved["history"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let server = server();
    let enrollee = register(&server, "Halima", "Sani", "NH-6001", "silver").await;
    let provider = create_provider(&server, "Kano Clinic").await;
    let claim = submit_claim(&server, &enrollee, &provider).await;
    let id = claim["id"].as_str().unwrap().to_string();
    let vetter = bearer("vetter-1", &[permissions::CLAIM_VET]);

    server
        .post(&format!("/api/v1/claims/{}/vetting/pick", id))
        .add_header(header::AUTHORIZATION, vetter.clone())
        .await;

    let blank = server
        .post(&format!("/api/v1/claims/{}/vetting/reject", id))
        .add_header(header::AUTHORIZATION, vetter.clone())
        .json(&json!({ "reason": "" }))
        .await;
    assert_eq!(blank.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let rejected = server
        .post(&format!("/api/v1/claims/{}/vetting/reject", id))
        .add_header(header::AUTHORIZATION, vetter)
        .json(&json!({ "reason": "Duplicate of an earlier claim" }))
        .await;
    assert_eq!(rejected.status_code(), StatusCode::OK);
    let body = rejected.json::<Value>();
    assert_eq!(body["stage"], "rejected");
    assert_eq!(body["rejection_reason"], "Duplicate of an earlier claim");
}

#[tokio::test]
async fn test_payment_batch_needs_a_second_approver() {
    let server = server();
    let enrollee = register(&server, "Yemi", "Alade", "NH-8001", "gold").await;
    let first_provider = create_provider(&server, "Island Hospital").await;
    let second_provider = create_provider(&server, "Ikeja Clinic").await;

    for provider in [&first_provider, &first_provider, &second_provider] {
        let claim = submit_claim(&server, &enrollee, provider).await;
        approve_claim(&server, claim["id"].as_str().unwrap()).await;
    }

    let finance = bearer("finance-1", &[permissions::BILLING_WRITE]);
    let period = json!({
        "period_start": (today() - Duration::days(1)).to_string(),
        "period_end": (today() + Duration::days(1)).to_string(),
    });
    let created = server
        .post("/api/v1/payment-batches")
        .add_header(header::AUTHORIZATION, finance.clone())
        .json(&period)
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let batch = created.json::<Value>();
    let id = batch["id"].as_str().unwrap().to_string();
    assert_eq!(batch["status"], "draft");
    assert_eq!(batch["claim_count"], 3);
    assert_eq!(batch["providers"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&batch["total"]), dec!(30000));

    // Claims already in a batch are not picked up again
    let again = server
        .post("/api/v1/payment-batches")
        .add_header(header::AUTHORIZATION, finance.clone())
        .json(&period)
        .await;
    assert_eq!(again.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let self_approval = server
        .post(&format!("/api/v1/payment-batches/{}/approve", id))
        .add_header(header::AUTHORIZATION, finance.clone())
        .await;
    assert_eq!(self_approval.status_code(), StatusCode::FORBIDDEN);

    let approved = server
        .post(&format!("/api/v1/payment-batches/{}/approve", id))
        .add_header(header::AUTHORIZATION, bearer("finance-2", &[permissions::BILLING_WRITE]))
        .await;
    assert_eq!(approved.status_code(), StatusCode::OK);
    assert_eq!(approved.json::<Value>()["approved_by"], "finance-2");

    let dashboard = server
        .get("/api/v1/dashboard")
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>();
    assert_eq!(dashboard["pending_batches"], 1);
    assert_eq!(decimal(&dashboard["pending_batch_total"]), dec!(30000));
    assert_eq!(dashboard["claims_by_stage"]["approved"], 3);
    assert_eq!(dashboard["payable_claims"], 0);

    let paid = server
        .post(&format!("/api/v1/payment-batches/{}/pay", id))
        .add_header(header::AUTHORIZATION, finance)
        .json(&json!({ "reference": "NIP-000123" }))
        .await;
    assert_eq!(paid.status_code(), StatusCode::OK);
    let paid = paid.json::<Value>();
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["paid_reference"], "NIP-000123");
}

#[tokio::test]
async fn test_cancelled_batch_releases_claims() {
    let server = server();
    let enrollee = register(&server, "Ifeoma", "Nwosu", "NH-9001", "gold").await;
    let provider = create_provider(&server, "Enugu Hospital").await;
    let claim = submit_claim(&server, &enrollee, &provider).await;
    approve_claim(&server, claim["id"].as_str().unwrap()).await;

    let finance = bearer("finance-1", &[permissions::BILLING_WRITE]);
    let batch = server
        .post("/api/v1/payment-batches")
        .add_header(header::AUTHORIZATION, finance.clone())
        .json(&json!({ "month": today().to_string() }))
        .await
        .json::<Value>();
    let id = batch["id"].as_str().unwrap().to_string();

    let cancelled = server
        .post(&format!("/api/v1/payment-batches/{}/cancel", id))
        .add_header(header::AUTHORIZATION, finance)
        .json(&json!({ "reason": "Provider bank details changed" }))
        .await;
    assert_eq!(cancelled.status_code(), StatusCode::OK);
    assert_eq!(cancelled.json::<Value>()["status"], "cancelled");

    let unbatched = server
        .get("/api/v1/claims")
        .add_query_param("unbatched", "true")
        .add_query_param("stage", "approved")
        .add_header(header::AUTHORIZATION, admin())
        .await
        .json::<Value>();
    assert_eq!(unbatched.as_array().unwrap().len(), 1);
}
