//! End-to-end tests driving the router the way an HTTP client would.

use std::sync::Arc;

use api_rest::{router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use transtrack_core::CoreConfig;

fn open_app() -> (TempDir, Router) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = AppState::new(Arc::new(CoreConfig::new(dir.path().to_path_buf())), None);
    (dir, router(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

#[tokio::test]
async fn health_is_reachable_without_a_key() {
    let (_dir, app) = open_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn patient_intake_scores_before_the_first_persist() {
    let (_dir, app) = open_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-100",
            "full_name": "Alex Doe",
            "organ_needed": "kidney",
            "blood_type": "O+",
            "medical_urgency": "high"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["priority_score"].is_f64());
    assert!(body["priority_score_breakdown"]["final_score"].is_f64());

    let (status, list) = send(&app, Method::GET, "/patients", None).await;
    assert_eq!(status, StatusCode::OK);
    let summaries = list.as_array().expect("array");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["medical_record_number"], json!("MRN-100"));
    assert!(summaries[0]["priority_score"].is_f64());
}

#[tokio::test]
async fn blank_intake_fields_are_rejected() {
    let (_dir, app) = open_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "   ",
            "full_name": "Alex Doe",
            "organ_needed": "kidney"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn editing_clinical_fields_rescores_the_patient() {
    let (_dir, app) = open_app();

    let (_, created) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-7",
            "full_name": "Sam Low",
            "organ_needed": "heart",
            "medical_urgency": "low"
        })),
    )
    .await;
    let id = created["id"].as_str().expect("id").to_owned();
    let before = created["priority_score"].as_f64().expect("score");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/patients/{id}"),
        Some(json!({
            "medical_urgency": "critical",
            "functional_status": "critical",
            "prognosis": "critical"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["medical_urgency"], json!("critical"));
    let after = updated["priority_score"].as_f64().expect("score");
    assert!(after > before);
}

#[tokio::test]
async fn calculate_priority_reports_success_with_breakdown() {
    let (_dir, app) = open_app();

    let (_, created) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-L1",
            "full_name": "Liver Case",
            "organ_needed": "liver",
            "meld_score": 30.0
        })),
    )
    .await;
    let id = created["id"].as_str().expect("id").to_owned();

    let (status, body) = send(
        &app,
        Method::POST,
        "/functions/calculate-priority",
        Some(json!({ "patient_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["patient_id"], json!(id));
    let score = body["priority_score"].as_f64().expect("score");
    assert_eq!(body["breakdown"]["final_score"].as_f64().expect("final"), score);
}

#[tokio::test]
async fn recalculate_priority_applies_the_legacy_formula() {
    let (_dir, app) = open_app();

    let added = (Utc::now() - Duration::days(365)).to_rfc3339();
    let (_, created) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-9",
            "full_name": "Kidney Case",
            "organ_needed": "kidney",
            "blood_type": "O+",
            "medical_urgency": "critical",
            "pra": 50.0,
            "cpra": 40.0,
            "date_added_to_waitlist": added
        })),
    )
    .await;
    let id = created["id"].as_str().expect("id").to_owned();

    let (status, body) = send(
        &app,
        Method::POST,
        "/functions/recalculate-priority",
        Some(json!({ "patient_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    // critical 30 + one year waited 25 + PRA 7.5 + CPRA 4 + O+ rarity 1
    assert_eq!(body["priority_score"].as_f64().expect("score"), 67.5);
    assert!(body.get("breakdown").is_none());
}

#[tokio::test]
async fn donor_matching_ranks_persists_and_notifies() {
    let (_dir, app) = open_app();

    send(
        &app,
        Method::POST,
        "/users",
        Some(json!({
            "email": "admin@example.org",
            "full_name": "Site Admin",
            "role": "admin"
        })),
    )
    .await;

    let (_, exact) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-B1",
            "full_name": "Exact Match",
            "organ_needed": "kidney",
            "blood_type": "B+",
            "medical_urgency": "critical"
        })),
    )
    .await;
    let (_, compatible) = send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-B2",
            "full_name": "Compatible Match",
            "organ_needed": "kidney",
            "blood_type": "AB+",
            "medical_urgency": "low"
        })),
    )
    .await;
    // waiting for a different organ, never considered
    send(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "medical_record_number": "MRN-B3",
            "full_name": "Liver Case",
            "organ_needed": "liver",
            "blood_type": "B+"
        })),
    )
    .await;

    let (_, donor) = send(
        &app,
        Method::POST,
        "/donors",
        Some(json!({
            "donor_identifier": "DON-1",
            "organ_type": "kidney",
            "blood_type": "B+"
        })),
    )
    .await;
    let donor_id = donor["id"].as_str().expect("donor id").to_owned();

    let (status, body) = send(
        &app,
        Method::POST,
        "/functions/donor-matching",
        Some(json!({ "donor_organ_id": donor_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["total_matches"], json!(2));
    assert_eq!(body["matches_created"], json!(2));
    let matches = body["matches"].as_array().expect("matches");
    assert_eq!(matches[0]["patient_id"], exact["id"]);
    assert_eq!(matches[0]["priority_rank"], json!(1));
    assert_eq!(matches[1]["patient_id"], compatible["id"]);
    assert_eq!(matches[1]["priority_rank"], json!(2));

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/donors/{donor_id}/matches"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().expect("array").len(), 2);

    let (status, inbox) = send(
        &app,
        Method::GET,
        "/notifications?recipient=admin%40example.org",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let notifications = inbox.as_array().expect("array");
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["kind"], json!("donor_match"));
    assert_eq!(notifications[0]["read"], json!(false));

    let first_id = notifications[0]["id"].as_str().expect("id").to_owned();
    let (status, read) = send(
        &app,
        Method::POST,
        &format!("/notifications/{first_id}/read"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], json!(true));

    let (_, unread) = send(
        &app,
        Method::GET,
        "/notifications?recipient=admin%40example.org&unread_only=true",
        None,
    )
    .await;
    assert_eq!(unread.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn identifier_errors_distinguish_malformed_from_absent() {
    let (_dir, app) = open_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/functions/calculate-priority",
        Some(json!({ "patient_id": "not-an-id" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("message").contains("not-an-id"));

    let absent = "0123456789abcdef0123456789abcdef";
    let (status, body) = send(
        &app,
        Method::POST,
        "/functions/calculate-priority",
        Some(json!({ "patient_id": absent })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().expect("message").contains(absent));
}

#[tokio::test]
async fn configured_api_key_gates_every_route_except_health() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = AppState::new(
        Arc::new(CoreConfig::new(dir.path().to_path_buf())),
        Some("secret".to_owned()),
    );
    let app = router(state);

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/patients", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let wrong = Request::builder()
        .method(Method::GET)
        .uri("/patients")
        .header("x-api-key", "nope")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(wrong).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .method(Method::GET)
        .uri("/patients")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(right).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn weights_activation_supersedes_and_validates() {
    let (_dir, app) = open_app();

    let (status, body) = send(&app, Method::GET, "/weights/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("default"));
    assert_eq!(body["is_active"], json!(false));

    let (status, body) = send(
        &app,
        Method::POST,
        "/weights",
        Some(json!({
            "name": "urgency-first",
            "medical_urgency_weight": 50.0,
            "time_on_waitlist_weight": 20.0,
            "organ_specific_weight": 10.0,
            "evaluation_recency_weight": 10.0,
            "blood_type_rarity_weight": 10.0,
            "evaluation_decay_rate": 0.25
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_active"], json!(true));

    let (_, active) = send(&app, Method::GET, "/weights/active", None).await;
    assert_eq!(active["name"], json!("urgency-first"));
    assert_eq!(active["is_active"], json!(true));

    let (status, body) = send(
        &app,
        Method::POST,
        "/weights",
        Some(json!({
            "name": "broken",
            "medical_urgency_weight": 90.0,
            "time_on_waitlist_weight": 20.0,
            "organ_specific_weight": 10.0,
            "evaluation_recency_weight": 10.0,
            "blood_type_rarity_weight": 10.0,
            "evaluation_decay_rate": 0.25
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("message").contains("sum to 100"));
}

#[tokio::test]
async fn duplicate_user_email_is_rejected() {
    let (_dir, app) = open_app();

    let payload = json!({
        "email": "coordinator@example.org",
        "full_name": "Casey Coordinator",
        "role": "coordinator"
    });
    let (status, _) = send(&app, Method::POST, "/users", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/users", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("already exists"));
}
