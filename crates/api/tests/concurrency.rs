//! Concurrent signing through the full router.
//!
//! Requests are spawned as separate tasks on separate pool connections, so
//! the serializable transactions and conditional updates race for real.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    add_record, admin_token, body_json, build_test_app, post_json_auth, seed_group, seed_team_a,
    sign_party, sign_recipient, team_a, token_from_url, TestApp,
};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use signoff_db::repositories::{PartySignatureRepo, SubmissionPeriodRepo, WorkRecordRepo};
use signoff_events::bus::EVENT_READY_FOR_RECIPIENT;
use sqlx::PgPool;

/// Fire one party signature per token concurrently and collect
/// `(status, body)` for each.
async fn sign_concurrently(app: &TestApp, tokens: Vec<String>) -> Vec<(StatusCode, serde_json::Value)> {
    let handles = tokens.into_iter().map(|token| {
        let app = app.clone();
        tokio::spawn(async move {
            let response = sign_party(&app, &token).await;
            let status = response.status();
            (status, body_json(response).await)
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect()
}

/// Like [`sign_concurrently`], but each request first sleeps for its own
/// delay, so arrival order follows the delays rather than spawn order.
async fn sign_with_delays(
    app: &TestApp,
    tokens: Vec<String>,
    delays: Vec<Duration>,
) -> Vec<(StatusCode, serde_json::Value)> {
    let handles = tokens.into_iter().zip(delays).map(|(token, delay)| {
        let app = app.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let response = sign_party(&app, &token).await;
            let status = response.status();
            (status, body_json(response).await)
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn same_link_signed_concurrently_records_one_signature(pool: PgPool) {
    let (period, links) = seed_team_a(&pool, &["alice", "bob"]).await;
    let app = build_test_app(pool.clone());

    let results = sign_concurrently(&app, vec![links[0].clone(); 6]).await;

    let successes = results.iter().filter(|(s, _)| *s == StatusCode::OK).count();
    assert_eq!(successes, 1, "exactly one signer wins: {results:?}");
    for (status, body) in results.iter().filter(|(s, _)| *s != StatusCode::OK) {
        assert_eq!(*status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "ALREADY_SIGNED");
    }

    let signed = PartySignatureRepo::signed_parties(&pool, period.id).await.unwrap();
    assert_eq!(signed, vec!["alice".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn last_signers_racing_notify_recipient_once(pool: PgPool) {
    let parties = ["alice", "bob", "carol", "dave", "erin"];
    let (period, links) = seed_team_a(&pool, &parties).await;
    let app = build_test_app(pool.clone());
    let mut events = app.events.subscribe();

    let results = sign_concurrently(&app, links).await;

    assert!(
        results.iter().all(|(s, _)| *s == StatusCode::OK),
        "every distinct party signs: {results:?}"
    );
    let owners = results
        .iter()
        .filter(|(_, body)| body["data"]["notification"] == "sent")
        .count();
    assert_eq!(owners, 1, "exactly one request owns the hand-off");
    assert_eq!(
        results
            .iter()
            .filter(|(_, body)| body["data"]["all_signed"] == true)
            .count(),
        1
    );
    assert_eq!(app.notifier.attempts(), 1);

    let mut ready = 0;
    while let Ok(event) = events.try_recv() {
        if event.event_type == EVENT_READY_FOR_RECIPIENT {
            ready += 1;
        }
    }
    assert_eq!(ready, 1);

    let stored = SubmissionPeriodRepo::find_by_id(&pool, period.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "pending_recipient");
    assert_eq!(
        PartySignatureRepo::signed_parties(&pool, period.id).await.unwrap().len(),
        parties.len()
    );
}

/// Seeded runs over varying party counts and arrival jitter: whatever order
/// the signatures commit in, exactly one request owns the hand-off.
#[sqlx::test(migrations = "../../db/migrations")]
async fn hand_off_is_owned_once_under_random_arrival(pool: PgPool) {
    const PARTIES: [&str; 6] = ["alice", "bob", "carol", "dave", "erin", "frank"];
    let app = build_test_app(pool.clone());

    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let count = rng.random_range(2..=PARTIES.len());
        let group = format!("Team-{seed}");
        let (period, links) = seed_group(&pool, &group, &PARTIES[..count]).await;
        let delays = (0..count)
            .map(|_| Duration::from_millis(rng.random_range(0..25)))
            .collect();
        let attempts_before = app.notifier.attempts();

        let results = sign_with_delays(&app, links, delays).await;

        assert!(
            results.iter().all(|(s, _)| *s == StatusCode::OK),
            "seed {seed}: every distinct party signs: {results:?}"
        );
        let owners = results
            .iter()
            .filter(|(_, body)| body["data"]["notification"] == "sent")
            .count();
        assert_eq!(owners, 1, "seed {seed}: exactly one request owns the hand-off");
        assert_eq!(
            app.notifier.attempts() - attempts_before,
            1,
            "seed {seed}: the recipient is notified once"
        );

        let stored = SubmissionPeriodRepo::find_by_id(&pool, period.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "pending_recipient", "seed {seed}");
        assert_eq!(
            PartySignatureRepo::signed_parties(&pool, period.id).await.unwrap().len(),
            count
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_recipient_signatures_complete_once(pool: PgPool) {
    let (period, links) = seed_team_a(&pool, &["alice"]).await;
    let app = build_test_app(pool.clone());
    sign_party(&app, &links[0]).await;
    let token = app.notifier.last_token();

    let handles = (0..4).map(|_| {
        let app = app.clone();
        let token = token.clone();
        tokio::spawn(async move { sign_recipient(&app, &token).await.status() })
    });
    let statuses: Vec<StatusCode> = join_all(handles).await.into_iter().map(|s| s.unwrap()).collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert!(statuses
        .iter()
        .filter(|s| **s != StatusCode::OK)
        .all(|s| *s == StatusCode::BAD_REQUEST));

    let stored = SubmissionPeriodRepo::find_by_id(&pool, period.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "completed");
}

/// Team-A, March 2026: two employees, links issued by an admin, both sign,
/// the client countersigns.
#[sqlx::test(migrations = "../../db/migrations")]
async fn team_a_month_end_sign_off(pool: PgPool) {
    for day in [2, 3, 4] {
        add_record(&pool, "Team-A", "alice", day).await;
    }
    for day in [9, 10] {
        add_record(&pool, "Team-A", "bob", day).await;
    }
    let app = build_test_app(pool.clone());

    let response = post_json_auth(
        app.router.clone(),
        "/api/v1/admin/submissions",
        json!({
            "group_key": "Team-A",
            "month": 3,
            "year": 2026,
            "recipient": { "email": "client@example.com", "display_name": "Client" },
        }),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json_auth(
        app.router.clone(),
        "/api/v1/admin/submissions/Team-A/2026/3/party-links",
        json!({}),
        &admin_token(),
    )
    .await;
    let links = body_json(response).await["data"].clone();
    let tokens: Vec<String> = links
        .as_array()
        .unwrap()
        .iter()
        .map(|l| token_from_url(l["signing_url"].as_str().unwrap()))
        .collect();
    assert_eq!(tokens.len(), 2);

    let results = sign_concurrently(&app, tokens).await;
    assert!(results.iter().all(|(s, _)| *s == StatusCode::OK));
    assert_eq!(app.notifier.attempts(), 1);

    let response = sign_recipient(&app, &app.notifier.last_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "completed");

    let records = WorkRecordRepo::list_for_period(&pool, &team_a()).await.unwrap();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.status == "completed"));
}
