#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use signoff_api::auth::jwt::{generate_access_token, JwtConfig};
use signoff_api::config::{ServerConfig, SigningConfig};
use signoff_api::router::build_app_router;
use signoff_api::state::AppState;
use signoff_api::workflow::render::ContentHashRenderer;
use signoff_core::period::PeriodKey;
use signoff_core::tokens;
use signoff_db::models::submission_period::{CreateSubmissionPeriod, SubmissionPeriod};
use signoff_db::models::work_record::{CreateWorkRecord, WorkRecord};
use signoff_db::repositories::{PartySigningLinkRepo, SubmissionPeriodRepo, WorkRecordRepo};
use signoff_events::{EventBus, NotifyError, RecipientNotice, RecipientNotifier};

/// A signature payload that passes validation.
pub const VALID_SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

const TEST_JWT_SECRET: &str = "test-secret-for-signoff-api-integration-tests";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        signing: SigningConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// Recording notifier
// ---------------------------------------------------------------------------

/// Test double that records every notification attempt.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<RecipientNotice>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose every delivery fails after being recorded.
    pub fn failing() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Number of notification attempts so far.
    pub fn attempts(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    /// The most recent notice.
    pub fn last(&self) -> Option<RecipientNotice> {
        self.notices.lock().unwrap().last().cloned()
    }

    /// Plaintext recipient token from the most recent notice.
    pub fn last_token(&self) -> String {
        let notice = self.last().expect("no notification recorded");
        token_from_url(&notice.signing_url)
    }
}

#[async_trait]
impl RecipientNotifier for RecordingNotifier {
    async fn notify_recipient(&self, notice: &RecipientNotice) -> Result<(), NotifyError> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.fail {
            return Err(NotifyError::Rejected("mailbox unavailable".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub notifier: Arc<RecordingNotifier>,
    pub events: Arc<EventBus>,
}

/// Build the full application router with a recording notifier.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, RecordingNotifier::default())
}

/// Build the app with a notifier that always fails.
pub fn build_failing_notifier_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, RecordingNotifier::failing())
}

fn build_test_app_with(pool: PgPool, notifier: RecordingNotifier) -> TestApp {
    let config = test_config();
    let notifier = Arc::new(notifier);
    let events = Arc::new(EventBus::default());

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&events),
        notifier: notifier.clone(),
        renderer: Arc::new(ContentHashRenderer),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        notifier,
        events,
    }
}

/// A valid admin JWT for the test config.
pub fn admin_token() -> String {
    generate_access_token(1, "admin", &test_config().jwt).unwrap()
}

/// A valid JWT for a non-admin role.
pub fn viewer_token() -> String {
    generate_access_token(2, "viewer", &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign through the party endpoint with a valid payload.
pub async fn sign_party(app: &TestApp, token: &str) -> Response<Body> {
    post_json(
        app.router.clone(),
        &format!("/api/v1/sign/party/{token}"),
        serde_json::json!({ "signature_blob": VALID_SIGNATURE }),
    )
    .await
}

/// Sign through the recipient endpoint with a valid payload.
pub async fn sign_recipient(app: &TestApp, token: &str) -> Response<Body> {
    post_json(
        app.router.clone(),
        &format!("/api/v1/sign/recipient/{token}"),
        serde_json::json!({ "signature_blob": VALID_SIGNATURE }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub fn team_a() -> PeriodKey {
    PeriodKey::new("Team-A", 3, 2026).unwrap()
}

/// Insert one confirmed work record for `party` in March 2026.
pub async fn add_record(pool: &PgPool, group_key: &str, party: &str, day: u32) -> WorkRecord {
    WorkRecordRepo::create(
        pool,
        &CreateWorkRecord {
            group_key: group_key.to_string(),
            party_id: party.to_string(),
            work_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            status: Some("confirmed".to_string()),
        },
    )
    .await
    .unwrap()
}

/// Open the Team-A March 2026 period with a recipient override.
pub async fn open_team_a(pool: &PgPool) -> SubmissionPeriod {
    open_group(pool, "Team-A").await
}

/// Open `group_key`'s March 2026 period with the client@example.com override.
pub async fn open_group(pool: &PgPool, group_key: &str) -> SubmissionPeriod {
    let token = tokens::issue(chrono::Duration::days(14), Utc::now());
    let mut conn = pool.acquire().await.unwrap();
    let (period, _) = SubmissionPeriodRepo::ensure(
        &mut conn,
        &CreateSubmissionPeriod {
            key: PeriodKey::new(group_key, 3, 2026).unwrap(),
            recipient_email: Some("client@example.com".to_string()),
            recipient_name: Some("Client".to_string()),
            token_hash: token.hash,
            token_expires_at: token.expires_at,
        },
    )
    .await
    .unwrap();
    period
}

/// Issue a party link valid for `ttl`, returning the plaintext token.
pub async fn issue_link_with_ttl(
    pool: &PgPool,
    period_id: i64,
    party: &str,
    ttl: chrono::Duration,
) -> String {
    let token = tokens::issue(ttl, Utc::now());
    PartySigningLinkRepo::upsert(pool, period_id, party, &token.hash, token.expires_at)
        .await
        .unwrap();
    token.plaintext
}

/// Issue a 30-day party link, returning the plaintext token.
pub async fn issue_link(pool: &PgPool, period_id: i64, party: &str) -> String {
    issue_link_with_ttl(pool, period_id, party, chrono::Duration::days(30)).await
}

/// Seed Team-A March 2026 with one record per party and a link each.
///
/// Returns the period and the link tokens in `parties` order.
pub async fn seed_team_a(pool: &PgPool, parties: &[&str]) -> (SubmissionPeriod, Vec<String>) {
    seed_group(pool, "Team-A", parties).await
}

/// Seed `group_key`'s March 2026 period with one record per party and a
/// link each.
pub async fn seed_group(
    pool: &PgPool,
    group_key: &str,
    parties: &[&str],
) -> (SubmissionPeriod, Vec<String>) {
    for (i, party) in parties.iter().enumerate() {
        add_record(pool, group_key, party, 2 + i as u32).await;
    }
    let period = open_group(pool, group_key).await;
    let mut links = Vec::with_capacity(parties.len());
    for party in parties {
        links.push(issue_link(pool, period.id, party).await);
    }
    (period, links)
}

/// Last path segment of a signing URL.
pub fn token_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap().to_string()
}
