//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use inventory::InMemoryInventoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use seat_ledger::InMemoryTicketStore;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

type TestState = Arc<AppState<InMemoryTicketStore, InMemoryInventoryStore>>;

fn setup() -> axum::Router {
    setup_with_state().0
}

fn setup_with_state() -> (axum::Router, TestState) {
    let state = api::create_default_state();
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn delete(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

fn claim_body(uid: &str, seats: &[&str]) -> Value {
    json!({
        "uid": uid,
        "seats": seats,
        "event_title": "Home Opener",
        "start_time": "2026-11-20T19:00:00Z",
        "end_time": "2026-11-20T22:00:00Z",
        "email": format!("{uid}@example.com"),
        "name": uid,
    })
}

fn hold_body(kind: &str, seats: &[&str]) -> Value {
    json!({
        "kind": kind,
        "seats": seats,
        "event_title": "Home Opener",
        "start_time": "2026-11-20T19:00:00Z",
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_claim_seats() {
    let app = setup();

    let (status, json) = post(
        &app,
        "/events/evt1/claims",
        claim_body("alice", &["110-A1", "110-A2"]),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created_seats"], json!(["110-A1", "110-A2"]));
    assert_eq!(json["reused_seats"], json!([]));
    assert_eq!(json["inventory_synced"], true);
    assert!(json["order_id"].as_str().is_some());
}

#[tokio::test]
async fn test_conflicting_claim_returns_409_with_seats() {
    let app = setup();

    post(
        &app,
        "/events/evt1/claims",
        claim_body("alice", &["110-A1", "110-A2"]),
    )
    .await;

    let (status, json) = post(
        &app,
        "/events/evt1/claims",
        claim_body("bob", &["110-A1", "110-A3"]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["conflicting_seats"], json!(["110-A1"]));

    let (status, json) = post(&app, "/events/evt1/claims", claim_body("bob", &["110-A3"])).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created_seats"], json!(["110-A3"]));
}

#[tokio::test]
async fn test_reclaim_reports_reused_seats() {
    let app = setup();

    post(&app, "/events/evt1/claims", claim_body("alice", &["110-A1"])).await;
    let (status, json) = post(&app, "/events/evt1/claims", claim_body("alice", &["110-A1"])).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created_seats"], json!([]));
    assert_eq!(json["reused_seats"], json!(["110-A1"]));
}

#[tokio::test]
async fn test_invalid_claims_return_400() {
    let app = setup();

    let (status, _) = post(&app, "/events/evt1/claims", claim_body("", &["110-A1"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/events/evt1/claims", claim_body("alice", &["A1"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/events/evt1/claims", claim_body("alice", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = claim_body("alice", &["110-A1"]);
    body["end_time"] = json!("2026-11-20T18:00:00Z");
    let (status, json) = post(&app, "/events/evt1/claims", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("end_time"));

    let (_, taken) = get(&app, "/events/evt1/taken").await;
    assert_eq!(taken["seats"], json!([]));
}

#[tokio::test]
async fn test_availability_keeps_request_order() {
    let app = setup();

    post(
        &app,
        "/events/evt1/claims",
        claim_body("alice", &["110-A1", "110-A4"]),
    )
    .await;

    let (status, json) = post(
        &app,
        "/events/evt1/availability",
        json!({ "seats": ["110-A4", "110-A2", "110-A1", "110-A4"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["unavailable"], json!(["110-A4", "110-A1"]));
}

#[tokio::test]
async fn test_taken_seats_advertise_poll_interval() {
    let app = setup();

    post(
        &app,
        "/events/evt1/claims",
        claim_body("alice", &["110-A2", "110-A1"]),
    )
    .await;

    let (status, json) = get(&app, "/events/evt1/taken").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["event_id"], "evt1");
    assert_eq!(json["seats"], json!(["110-A1", "110-A2"]));
    assert_eq!(json["poll_interval_secs"], 5);
}

#[tokio::test]
async fn test_inventory_before_and_after_claims() {
    let app = setup();

    let (status, json) = get(&app, "/events/evt1/inventory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sections"], json!([]));
    assert_eq!(json["total_seats_sold"], 0);
    assert!(json["updated_at"].is_null());

    post(
        &app,
        "/events/evt1/claims",
        claim_body("alice", &["110-A1", "110-A2"]),
    )
    .await;
    post(
        &app,
        "/admin/events/evt1/holds",
        hold_body("unavailable", &["110-B1"]),
    )
    .await;

    let (_, json) = get(&app, "/events/evt1/inventory").await;
    let sections = json["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["section"], "110");
    assert_eq!(sections[0]["taken"], 2);
    assert_eq!(sections[0]["unavailable"], 1);
    assert_eq!(sections[0]["sold_out"], false);
    assert_eq!(json["total_seats_sold"], 2);
}

#[tokio::test]
async fn test_release_requires_ownership() {
    let app = setup();

    post(&app, "/events/evt1/claims", claim_body("alice", &["110-A1"])).await;

    let (status, json) = delete(&app, "/events/evt1/seats/110-A1?uid=bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["released"], false);

    let (status, json) = delete(&app, "/events/evt1/seats/110-A1?uid=alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["released"], true);

    let (_, taken) = get(&app, "/events/evt1/taken").await;
    assert_eq!(taken["seats"], json!([]));
}

#[tokio::test]
async fn test_admin_hold_shows_in_section_owners() {
    let app = setup();

    post(&app, "/events/evt1/claims", claim_body("alice", &["110-A2"])).await;
    let (status, json) = post(
        &app,
        "/admin/events/evt1/holds",
        hold_body("reserved", &["110-A1"]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created_seats"], json!(["110-A1"]));

    let (status, json) = get(&app, "/admin/events/evt1/sections/110").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["seat_id"], "110-A1");
    assert_eq!(rows[0]["owner"]["kind"], "admin_reserved");
    assert_eq!(rows[1]["seat_id"], "110-A2");
    assert_eq!(rows[1]["owner"]["uid"], "alice");
    assert_eq!(rows[1]["owner_email"], "alice@example.com");

    let (status, _) = post(
        &app,
        "/events/evt1/claims",
        claim_body("bob", &["110-A1"]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_hold_kind_is_rejected() {
    let app = setup();

    let (status, _) = post(
        &app,
        "/admin/events/evt1/holds",
        hold_body("vip", &["110-A1"]),
    )
    .await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_revoke_reopens_seat() {
    let app = setup();

    post(&app, "/events/evt1/claims", claim_body("alice", &["110-A1"])).await;

    let (status, json) = post(&app, "/admin/events/evt1/seats/110-A1/revoke", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["revoked"], true);

    let (_, json) = post(&app, "/admin/events/evt1/seats/110-A1/revoke", json!({})).await;
    assert_eq!(json["revoked"], false);

    let (status, _) = post(&app, "/events/evt1/claims", claim_body("bob", &["110-A1"])).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_event_invalidates_tickets() {
    let (app, state) = setup_with_state();

    post(
        &app,
        "/events/evt1/claims",
        claim_body("alice", &["110-A1", "110-A2"]),
    )
    .await;
    post(&app, "/events/evt1/claims", claim_body("bob", &["201-C7"])).await;

    let (status, json) = post(&app, "/admin/events/evt1/cancel", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["invalidated"], 3);

    let (_, taken) = get(&app, "/events/evt1/taken").await;
    assert_eq!(taken["seats"], json!([]));

    let (_, tickets) = get(&app, "/users/alice/tickets").await;
    let tickets = tickets.as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t["status"] == "Invalid"));

    assert_eq!(state.service.inventory().event_count().await, 0);
}

#[tokio::test]
async fn test_user_tickets_lists_every_event() {
    let app = setup();

    post(&app, "/events/evt1/claims", claim_body("alice", &["110-A1"])).await;
    post(&app, "/events/evt2/claims", claim_body("alice", &["201-B3"])).await;
    post(&app, "/events/evt2/claims", claim_body("bob", &["201-B4"])).await;

    let (status, json) = get(&app, "/users/alice/tickets").await;

    assert_eq!(status, StatusCode::OK);
    let tickets = json.as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t["owner"]["uid"] == "alice"));
    assert!(tickets.iter().all(|t| t["status"] == "Issued"));
}

#[tokio::test]
async fn test_audit_and_reconcile_repair_drift() {
    let (app, state) = setup_with_state();

    state.service.inventory().fail_with_permission_denied(true);
    let (status, json) = post(&app, "/events/evt1/claims", claim_body("alice", &["110-A1"])).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["inventory_synced"], false);
    state.service.inventory().fail_with_permission_denied(false);

    let (status, json) = get(&app, "/admin/events/evt1/audit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["consistent"], false);
    assert_eq!(json["actual_seats_sold"], 1);
    assert!(json["stored_seats_sold"].is_null());

    let (status, json) = post(&app, "/admin/events/evt1/reconcile", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sections"][0]["section"], "110");

    let (_, json) = get(&app, "/admin/events/evt1/audit").await;
    assert_eq!(json["consistent"], true);

    let (_, inventory) = get(&app, "/events/evt1/inventory").await;
    assert_eq!(inventory["total_seats_sold"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    post(&app, "/events/evt-metrics/claims", claim_body("alice", &["110-A1"])).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("seat_claims_total"));
}
