//! HTTP API integration tests.
//!
//! Runs the full router over the in-memory ports: auth flow, event CRUD and
//! joins, payment verification, and the error-body contract.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::http::StatusCode;
use axum_test::TestServer;
use gatherly_core::store::AccountStore;
use gatherly_server::lifecycle::EventLifecycle;
use gatherly_server::notify::NotificationDispatcher;
use gatherly_server::{AppState, build_router};
use gatherly_testing::{InMemoryStore, RecordingPushGateway, StubPaymentVerifier};
use serde_json::{Value, json};
use std::sync::Arc;

fn test_server(verifier: StubPaymentVerifier) -> (TestServer, InMemoryStore) {
    let store = InMemoryStore::new();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(RecordingPushGateway::new()),
    ));
    let lifecycle = Arc::new(EventLifecycle::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(verifier),
        dispatcher.clone(),
    ));
    let state = AppState {
        lifecycle,
        dispatcher,
        accounts: Arc::new(store.clone()),
        events: Arc::new(store.clone()),
        transactions: Arc::new(store.clone()),
        notifications: Arc::new(store.clone()),
        sessions: Arc::new(store.clone()),
        session_ttl: chrono::Duration::days(7),
    };
    let server = TestServer::new(build_router(state)).unwrap();
    (server, store)
}

async fn signup_and_signin(server: &TestServer, email: &str) -> String {
    let signup = server
        .post("/api/v1/user/signup")
        .json(&json!({
            "email": email,
            "password": "correct-horse",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;
    signup.assert_status(StatusCode::CREATED);

    let signin = server
        .post("/api/v1/user/signin")
        .json(&json!({"email": email, "password": "correct-horse"}))
        .await;
    signin.assert_status(StatusCode::OK);
    let body: Value = signin.json();
    body["token"].as_str().unwrap().to_string()
}

async fn create_event(server: &TestServer, token: &str, title: &str, capacity: u32) -> String {
    let response = server
        .post("/api/v1/events")
        .authorization_bearer(token)
        .json(&json!({
            "title": title,
            "description": "Created through the HTTP API",
            "location": "Community hall",
            "max_participants": capacity,
            "category": "social",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoints_are_public() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    server.get("/health").await.assert_status(StatusCode::OK);
    server.get("/ready").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn signup_signin_profile_flow() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let token = signup_and_signin(&server, "ada@example.com").await;

    let profile = server
        .get("/api/v1/user/profile")
        .authorization_bearer(&token)
        .await;
    profile.assert_status(StatusCode::OK);
    let body: Value = profile.json();
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["points"], 0);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());

    let no_header = server.get("/api/v1/user/profile").await;
    no_header.assert_status(StatusCode::UNAUTHORIZED);

    let bad_token = server
        .get("/api/v1/user/profile")
        .authorization_bearer("not-a-uuid")
        .await;
    bad_token.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    signup_and_signin(&server, "dup@example.com").await;

    let again = server
        .post("/api/v1/user/signup")
        .json(&json!({
            "email": "dup@example.com",
            "password": "correct-horse",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;
    again.assert_status(StatusCode::CONFLICT);
    let body: Value = again.json();
    assert_eq!(body["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    signup_and_signin(&server, "ada@example.com").await;

    let signin = server
        .post("/api/v1/user/signin")
        .json(&json!({"email": "ada@example.com", "password": "wrong-horse!"}))
        .await;
    signin.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = signin.json();
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn event_creation_validates_the_body() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let token = signup_and_signin(&server, "host@example.com").await;

    let response = server
        .post("/api/v1/events")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "",
            "description": "No title",
            "location": "Somewhere",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_join_and_fetch_event_flow() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let guest_token = signup_and_signin(&server, "guest@example.com").await;
    let event_id = create_event(&server, &host_token, "Quiz night", 10).await;

    let join = server
        .post(&format!("/api/v1/events/{event_id}/join"))
        .authorization_bearer(&guest_token)
        .await;
    join.assert_status(StatusCode::OK);
    let body: Value = join.json();
    assert_eq!(body["participants"].as_array().unwrap().len(), 1);

    let again = server
        .post(&format!("/api/v1/events/{event_id}/join"))
        .authorization_bearer(&guest_token)
        .await;
    again.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = again.json();
    assert_eq!(body["code"], "ALREADY_JOINED");

    let fetched = server.get(&format!("/api/v1/events/{event_id}")).await;
    fetched.assert_status(StatusCode::OK);
    let body: Value = fetched.json();
    assert_eq!(body["host"]["email"], "host@example.com");
    assert_eq!(body["participants"][0]["email"], "guest@example.com");
}

#[tokio::test]
async fn full_event_rejects_joins_over_http() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let a_token = signup_and_signin(&server, "a@example.com").await;
    let b_token = signup_and_signin(&server, "b@example.com").await;
    let event_id = create_event(&server, &host_token, "Tiny dinner", 1).await;

    server
        .post(&format!("/api/v1/events/{event_id}/join"))
        .authorization_bearer(&a_token)
        .await
        .assert_status(StatusCode::OK);

    let full = server
        .post(&format!("/api/v1/events/{event_id}/join"))
        .authorization_bearer(&b_token)
        .await;
    full.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = full.json();
    assert_eq!(body["code"], "EVENT_FULL");
}

#[tokio::test]
async fn missing_event_is_404() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let response = server
        .get("/api/v1/events/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn listing_supports_search_and_category() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let token = signup_and_signin(&server, "host@example.com").await;
    create_event(&server, &token, "Morning yoga", 10).await;
    create_event(&server, &token, "Rust meetup", 10).await;

    let all = server.get("/api/v1/events").await;
    all.assert_status(StatusCode::OK);
    let body: Value = all.json();
    assert_eq!(body["total"], 2);

    let searched = server.get("/api/v1/events?search=yoga").await;
    let body: Value = searched.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["events"][0]["title"], "Morning yoga");
}

#[tokio::test]
async fn completion_over_http_awards_points() {
    let (server, store) = test_server(StubPaymentVerifier::completing());
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let guest_token = signup_and_signin(&server, "guest@example.com").await;
    let event_id = create_event(&server, &host_token, "Book club", 10).await;

    server
        .post(&format!("/api/v1/events/{event_id}/join"))
        .authorization_bearer(&guest_token)
        .await
        .assert_status(StatusCode::OK);

    let guest = store
        .find_by_email("guest@example.com")
        .await
        .unwrap()
        .unwrap();
    let complete = server
        .post(&format!("/api/v1/events/{event_id}/complete"))
        .authorization_bearer(&host_token)
        .json(&json!({"attended_account_ids": [guest.id]}))
        .await;
    complete.assert_status(StatusCode::OK);
    let body: Value = complete.json();
    assert_eq!(body["newly_completed"], true);
    assert_eq!(body["award"], 50);

    let profile = server
        .get("/api/v1/user/profile")
        .authorization_bearer(&guest_token)
        .await;
    let body: Value = profile.json();
    assert_eq!(body["points"], 50);
}

#[tokio::test]
async fn non_host_completion_is_404_and_changes_nothing() {
    let (server, _store) = test_server(StubPaymentVerifier::completing());
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let guest_token = signup_and_signin(&server, "guest@example.com").await;
    let event_id = create_event(&server, &host_token, "Host only", 10).await;

    let response = server
        .post(&format!("/api/v1/events/{event_id}/complete"))
        .authorization_bearer(&guest_token)
        .json(&json!({"attended_account_ids": []}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let fetched = server.get(&format!("/api/v1/events/{event_id}")).await;
    let body: Value = fetched.json();
    assert_eq!(body["is_completed"], false);
}

#[tokio::test]
async fn payment_verification_over_http() {
    let verifier = StubPaymentVerifier::completing();
    let (server, store) = test_server(verifier);
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let payer_token = signup_and_signin(&server, "payer@example.com").await;
    let event_id = create_event(&server, &host_token, "Paid workshop", 10).await;
    let payer = store
        .find_by_email("payer@example.com")
        .await
        .unwrap()
        .unwrap();

    let verify = server
        .post("/api/v1/payment/verify-manual")
        .authorization_bearer(&payer_token)
        .json(&json!({
            "ref_id": "ESW-1234",
            "event_id": event_id,
            "user_id": payer.id,
            "amount": 2500,
        }))
        .await;
    verify.assert_status(StatusCode::OK);
    let body: Value = verify.json();
    assert_eq!(body["status"], "COMPLETE");
    assert_eq!(body["ref_id"], "ESW-1234");

    let replay = server
        .post("/api/v1/payment/verify-manual")
        .authorization_bearer(&payer_token)
        .json(&json!({
            "ref_id": "ESW-1234",
            "event_id": event_id,
            "user_id": payer.id,
            "amount": 2500,
        }))
        .await;
    replay.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = replay.json();
    assert_eq!(body["code"], "DUPLICATE_REFERENCE");
}

#[tokio::test]
async fn paying_for_someone_else_is_forbidden() {
    let (server, store) = test_server(StubPaymentVerifier::completing());
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let payer_token = signup_and_signin(&server, "payer@example.com").await;
    let event_id = create_event(&server, &host_token, "Paid workshop", 10).await;
    let host = store
        .find_by_email("host@example.com")
        .await
        .unwrap()
        .unwrap();

    let verify = server
        .post("/api/v1/payment/verify-manual")
        .authorization_bearer(&payer_token)
        .json(&json!({
            "ref_id": "ESW-5555",
            "event_id": event_id,
            "user_id": host.id,
            "amount": 2500,
        }))
        .await;
    verify.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn unverified_payment_is_400_over_http() {
    let (server, store) = test_server(StubPaymentVerifier::with_status(
        gatherly_core::payment::PaymentStatus::Pending,
    ));
    let host_token = signup_and_signin(&server, "host@example.com").await;
    let payer_token = signup_and_signin(&server, "payer@example.com").await;
    let event_id = create_event(&server, &host_token, "Paid workshop", 10).await;
    let payer = store
        .find_by_email("payer@example.com")
        .await
        .unwrap()
        .unwrap();

    let verify = server
        .post("/api/v1/payment/verify-manual")
        .authorization_bearer(&payer_token)
        .json(&json!({
            "ref_id": "ESW-9999",
            "event_id": event_id,
            "user_id": payer.id,
            "amount": 2500,
        }))
        .await;
    verify.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = verify.json();
    assert_eq!(body["code"], "PAYMENT_NOT_VERIFIED");
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn push_token_registration_and_notification_history() {
    let (server, store) = test_server(StubPaymentVerifier::completing());
    let token = signup_and_signin(&server, "host@example.com").await;

    let register = server
        .put("/api/v1/user/push-token")
        .authorization_bearer(&token)
        .json(&json!({"token": "device-abc"}))
        .await;
    register.assert_status(StatusCode::NO_CONTENT);

    create_event(&server, &token, "Announced event", 10).await;
    assert!(store.notification_count() >= 1);

    let history = server
        .get("/api/v1/notifications")
        .authorization_bearer(&token)
        .await;
    history.assert_status(StatusCode::OK);
    let body: Value = history.json();
    assert!(!body.as_array().unwrap().is_empty());

    let send = server
        .post("/api/v1/notifications/send")
        .authorization_bearer(&token)
        .json(&json!({"title": "Hello", "body": "Manual broadcast"}))
        .await;
    send.assert_status(StatusCode::OK);
    let body: Value = send.json();
    assert_eq!(body["attempted"], 1);
    assert_eq!(body["delivered"], 1);
}
