//! Admin endpoints: opening periods, links, release, resend, status and
//! group recipients.

mod common;

use axum::http::StatusCode;
use common::{
    add_record, admin_token, body_json, build_failing_notifier_app, build_test_app, get_auth,
    post_json, post_json_auth, put_json_auth, seed_team_a, sign_party, sign_recipient,
    token_from_url, viewer_token, TestApp,
};
use serde_json::json;
use signoff_db::repositories::SubmissionPeriodRepo;
use sqlx::PgPool;

const TEAM_A: &str = "/api/v1/admin/submissions/Team-A/2026/3";

async fn admin_post(app: &TestApp, uri: &str, body: serde_json::Value) -> axum::http::Response<axum::body::Body> {
    post_json_auth(app.router.clone(), uri, body, &admin_token()).await
}

async fn status_of(app: &TestApp) -> serde_json::Value {
    let response = get_auth(app.router.clone(), TEAM_A, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_routes_require_admin_role(pool: PgPool) {
    let app = build_test_app(pool);
    let body = json!({ "group_key": "Team-A", "month": 3, "year": 2026 });

    let response = post_json(app.router.clone(), "/api/v1/admin/submissions", body.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = post_json_auth(
        app.router.clone(),
        "/api/v1/admin/submissions",
        body,
        &viewer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.router.clone(), TEAM_A, "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Opening and status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_submission_is_idempotent(pool: PgPool) {
    let app = build_test_app(pool);
    let body = json!({
        "group_key": "Team-A",
        "month": 3,
        "year": 2026,
        "recipient": { "email": "client@example.com", "display_name": "Client" },
    });

    let response = admin_post(&app, "/api/v1/admin/submissions", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = &body_json(response).await["data"];
    assert_eq!(data["created"], true);
    assert_eq!(data["status"], "pending_employees");
    assert_eq!(data["recipient_email"], "client@example.com");

    let response = admin_post(&app, "/api/v1/admin/submissions", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["created"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_submission_validates_input(pool: PgPool) {
    let app = build_test_app(pool);

    let response = admin_post(
        &app,
        "/api/v1/admin/submissions",
        json!({ "group_key": "Team-A", "month": 13, "year": 2026 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = admin_post(
        &app,
        "/api/v1/admin/submissions",
        json!({
            "group_key": "Team-A",
            "month": 3,
            "year": 2026,
            "recipient": { "email": "not-an-email", "display_name": "Client" },
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_of_unopened_period_is_not_started(pool: PgPool) {
    add_record(&pool, "Team-A", "alice", 2).await;
    add_record(&pool, "Team-A", "bob", 3).await;
    let app = build_test_app(pool);

    let data = status_of(&app).await;
    assert_eq!(data["status"], "not_started");
    assert_eq!(data["required_parties"], json!(["alice", "bob"]));
    assert_eq!(data["progress"]["signed"], 0);
    assert_eq!(data["progress"]["total"], 2);
    assert!(data["token_expires_at"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_tracks_signatures(pool: PgPool) {
    let (_, links) = seed_team_a(&pool, &["alice", "bob"]).await;
    let app = build_test_app(pool);
    sign_party(&app, &links[1]).await;

    let data = status_of(&app).await;
    assert_eq!(data["status"], "pending_employees");
    assert_eq!(data["progress"]["signed"], 1);
    assert_eq!(data["signatures"][0]["party_id"], "bob");
    assert_eq!(data["recipient_email"], "client@example.com");
    assert!(data["token_expires_at"].is_string());
}

// ---------------------------------------------------------------------------
// Party links
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn issued_links_open_period_and_sign(pool: PgPool) {
    add_record(&pool, "Team-A", "alice", 2).await;
    add_record(&pool, "Team-A", "bob", 3).await;
    let app = build_test_app(pool);

    let response = admin_post(&app, &format!("{TEAM_A}/party-links"), json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let links = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0]["party_id"], "alice");
    assert_eq!(links[1]["party_id"], "bob");
    let url = links[0]["signing_url"].as_str().unwrap();
    assert!(url.contains("/sign/party/"));

    let response = sign_party(&app, &token_from_url(url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_of(&app).await["status"], "pending_employees");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn links_only_for_required_parties(pool: PgPool) {
    seed_team_a(&pool, &["alice"]).await;
    let app = build_test_app(pool);

    let response = admin_post(
        &app,
        &format!("{TEAM_A}/party-links"),
        json!({ "parties": ["mallory"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = admin_post(
        &app,
        &format!("{TEAM_A}/party-links"),
        json!({ "parties": ["alice", "alice"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn links_cannot_be_issued_after_hand_off(pool: PgPool) {
    let (_, links) = seed_team_a(&pool, &["alice"]).await;
    let app = build_test_app(pool);
    sign_party(&app, &links[0]).await;

    let response = admin_post(&app, &format!("{TEAM_A}/party-links"), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

// ---------------------------------------------------------------------------
// Manual release and resend
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn release_requires_note(pool: PgPool) {
    seed_team_a(&pool, &["alice", "bob"]).await;
    let app = build_test_app(pool);

    let response = admin_post(&app, &format!("{TEAM_A}/release"), json!({ "note": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(status_of(&app).await["status"], "pending_employees");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn release_hands_off_with_override(pool: PgPool) {
    let (period, links) = seed_team_a(&pool, &["alice", "bob"]).await;
    let app = build_test_app(pool.clone());
    sign_party(&app, &links[0]).await;

    let response = admin_post(
        &app,
        &format!("{TEAM_A}/release"),
        json!({ "note": "bob is on leave" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["status"], "pending_recipient");
    assert_eq!(data["manual_override"], true);
    assert_eq!(data["notification"], "sent");
    assert_eq!(app.notifier.attempts(), 1);

    let stored = SubmissionPeriodRepo::find_by_id(&pool, period.id).await.unwrap().unwrap();
    assert!(stored.manual_override);
    assert_eq!(stored.override_note.as_deref(), Some("bob is on leave"));

    // The recipient sees the override and can complete.
    let token = app.notifier.last_token();
    let response = sign_recipient(&app, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    // A second release finds the period already handed off.
    let response = admin_post(&app, &format!("{TEAM_A}/release"), json!({ "note": "again" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn release_with_failed_notification_is_multi_status(pool: PgPool) {
    seed_team_a(&pool, &["alice"]).await;
    let app = build_failing_notifier_app(pool);

    let response = admin_post(&app, &format!("{TEAM_A}/release"), json!({ "note": "deadline" })).await;
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    assert_eq!(body_json(response).await["data"]["notification"], "failed");
    assert_eq!(status_of(&app).await["status"], "pending_recipient");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resend_replaces_recipient_token(pool: PgPool) {
    let (_, links) = seed_team_a(&pool, &["alice"]).await;
    let app = build_test_app(pool);

    let response = admin_post(&app, &format!("{TEAM_A}/resend-recipient"), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");

    sign_party(&app, &links[0]).await;
    let first = app.notifier.last_token();

    let response = admin_post(&app, &format!("{TEAM_A}/resend-recipient"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["notification"], "sent");
    assert_eq!(app.notifier.attempts(), 2);
    let second = app.notifier.last_token();
    assert_ne!(first, second);

    assert_eq!(sign_recipient(&app, &first).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(sign_recipient(&app, &second).await.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Group recipients
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn group_recipient_is_used_without_override(pool: PgPool) {
    add_record(&pool, "Team-A", "alice", 2).await;
    let app = build_test_app(pool);

    let response = put_json_auth(
        app.router.clone(),
        "/api/v1/admin/groups/Team-A/recipient",
        json!({ "email": "bad", "display_name": "Finance" }),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app.router.clone(),
        "/api/v1/admin/groups/Team-A/recipient",
        json!({ "email": "finance@example.com", "display_name": "Finance" }),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["email"], "finance@example.com");

    let response = admin_post(&app, &format!("{TEAM_A}/party-links"), json!({})).await;
    let links = body_json(response).await["data"].clone();
    let token = token_from_url(links[0]["signing_url"].as_str().unwrap());

    let response = sign_party(&app, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.notifier.last().unwrap().email, "finance@example.com");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hand_off_without_any_recipient_reports_failure(pool: PgPool) {
    add_record(&pool, "Team-A", "alice", 2).await;
    let app = build_test_app(pool);

    let response = admin_post(&app, &format!("{TEAM_A}/party-links"), json!({})).await;
    let links = body_json(response).await["data"].clone();
    let token = token_from_url(links[0]["signing_url"].as_str().unwrap());

    let response = sign_party(&app, &token).await;
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    assert_eq!(body_json(response).await["data"]["notification"], "failed");
    assert_eq!(app.notifier.attempts(), 0);
}
