//! Integration tests for the submission period lifecycle at the storage layer.
//!
//! - Idempotent `ensure`
//! - Conditional transitions report who owns them
//! - Schema constraints backing the signature ledger

use chrono::{Duration, Utc};
use sqlx::PgPool;
use signoff_core::period::PeriodKey;
use signoff_core::submission::SubmissionStatus;
use signoff_db::models::party_signature::CreatePartySignature;
use signoff_db::models::submission_period::{CreateSubmissionPeriod, SubmissionPeriod};
use signoff_db::repositories::party_signature_repo::UNIQUE_PERIOD_PARTY;
use signoff_db::repositories::{PartySignatureRepo, PartySigningLinkRepo, SubmissionPeriodRepo};
use signoff_db::{is_serialization_failure, is_unique_violation};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BLOB: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAAB";

fn team_a() -> PeriodKey {
    PeriodKey::new("Team-A", 3, 2026).unwrap()
}

fn new_period(key: PeriodKey, token_hash: &str) -> CreateSubmissionPeriod {
    CreateSubmissionPeriod {
        key,
        recipient_email: None,
        recipient_name: None,
        token_hash: token_hash.to_string(),
        token_expires_at: Utc::now() + Duration::days(14),
    }
}

async fn open(pool: &PgPool, token_hash: &str) -> SubmissionPeriod {
    let mut conn = pool.acquire().await.unwrap();
    let (period, created) = SubmissionPeriodRepo::ensure(&mut conn, &new_period(team_a(), token_hash))
        .await
        .unwrap();
    assert!(created);
    period
}

fn signature(period_id: i64, party: &str) -> CreatePartySignature {
    CreatePartySignature {
        period_id,
        party_id: party.to_string(),
        signature_blob: BLOB.to_string(),
        origin_ip: Some("203.0.113.7".to_string()),
        token_hash: format!("link-{party}"),
        token_expires_at: Utc::now() + Duration::days(30),
    }
}

// ---------------------------------------------------------------------------
// ensure
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ensure_is_idempotent(pool: PgPool) {
    let first = open(&pool, "hash-1").await;
    assert_eq!(first.status().unwrap(), SubmissionStatus::PendingEmployees);

    let mut conn = pool.acquire().await.unwrap();
    let (second, created) = SubmissionPeriodRepo::ensure(&mut conn, &new_period(team_a(), "hash-2"))
        .await
        .unwrap();

    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.token_hash, "hash-1");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_by_key_distinguishes_months(pool: PgPool) {
    open(&pool, "hash-1").await;

    let april = PeriodKey::new("Team-A", 4, 2026).unwrap();
    assert!(SubmissionPeriodRepo::find_by_key(&pool, &april)
        .await
        .unwrap()
        .is_none());
    assert!(SubmissionPeriodRepo::find_by_key(&pool, &team_a())
        .await
        .unwrap()
        .is_some());
}

// ---------------------------------------------------------------------------
// Conditional transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn release_succeeds_once(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    let expires = Utc::now() + Duration::days(14);

    assert!(SubmissionPeriodRepo::release_to_recipient(&pool, period.id, "hash-2", expires, None)
        .await
        .unwrap());
    assert!(!SubmissionPeriodRepo::release_to_recipient(&pool, period.id, "hash-3", expires, None)
        .await
        .unwrap());

    let reloaded = SubmissionPeriodRepo::find_by_key(&pool, &team_a())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status().unwrap(), SubmissionStatus::PendingRecipient);
    assert_eq!(reloaded.token_hash, "hash-2");
    assert!(!reloaded.manual_override);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_release_records_override(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    let expires = Utc::now() + Duration::days(14);

    assert!(SubmissionPeriodRepo::release_to_recipient(
        &pool,
        period.id,
        "hash-2",
        expires,
        Some("bob is on leave")
    )
    .await
    .unwrap());

    let reloaded = SubmissionPeriodRepo::find_by_token_hash(&pool, "hash-2")
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.manual_override);
    assert_eq!(reloaded.override_note.as_deref(), Some("bob is on leave"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_requires_pending_recipient_and_current_token(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    let expires = Utc::now() + Duration::days(14);

    // Not yet released.
    assert!(!SubmissionPeriodRepo::complete(&pool, period.id, "hash-1", BLOB, None)
        .await
        .unwrap());

    SubmissionPeriodRepo::release_to_recipient(&pool, period.id, "hash-2", expires, None)
        .await
        .unwrap();

    // Superseded token.
    assert!(!SubmissionPeriodRepo::complete(&pool, period.id, "hash-1", BLOB, None)
        .await
        .unwrap());
    assert!(SubmissionPeriodRepo::complete(&pool, period.id, "hash-2", BLOB, Some("198.51.100.1"))
        .await
        .unwrap());
    // Replay.
    assert!(!SubmissionPeriodRepo::complete(&pool, period.id, "hash-2", BLOB, None)
        .await
        .unwrap());

    let done = SubmissionPeriodRepo::find_by_key(&pool, &team_a())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status().unwrap(), SubmissionStatus::Completed);
    assert!(done.recipient_signature.is_some());
    assert!(done.recipient_signed_at.is_some());
    assert_eq!(done.recipient_ip.as_deref(), Some("198.51.100.1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn document_ref_only_attaches_to_completed_period(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    assert!(!SubmissionPeriodRepo::set_document_ref(&pool, period.id, "sha256:abc")
        .await
        .unwrap());

    let expires = Utc::now() + Duration::days(14);
    SubmissionPeriodRepo::release_to_recipient(&pool, period.id, "hash-2", expires, None)
        .await
        .unwrap();
    SubmissionPeriodRepo::complete(&pool, period.id, "hash-2", BLOB, None)
        .await
        .unwrap();

    assert!(SubmissionPeriodRepo::set_document_ref(&pool, period.id, "sha256:abc")
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_clears_recipient_outcome(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    let expires = Utc::now() + Duration::days(14);
    SubmissionPeriodRepo::release_to_recipient(&pool, period.id, "hash-2", expires, Some("forced"))
        .await
        .unwrap();
    SubmissionPeriodRepo::complete(&pool, period.id, "hash-2", BLOB, None)
        .await
        .unwrap();
    SubmissionPeriodRepo::set_document_ref(&pool, period.id, "sha256:abc")
        .await
        .unwrap();

    assert!(SubmissionPeriodRepo::reset(&pool, period.id, "hash-3", expires)
        .await
        .unwrap());

    let reset = SubmissionPeriodRepo::find_by_key(&pool, &team_a())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reset.status().unwrap(), SubmissionStatus::PendingEmployees);
    assert!(reset.recipient_signature.is_none());
    assert!(reset.recipient_signed_at.is_none());
    assert!(!reset.manual_override);
    assert!(reset.override_note.is_none());
    assert!(reset.document_ref.is_none());
    assert_eq!(reset.token_hash, "hash-3");
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn signature_without_completed_status_is_rejected(pool: PgPool) {
    let period = open(&pool, "hash-1").await;

    let result = sqlx::query("UPDATE submission_periods SET recipient_signature = $2 WHERE id = $1")
        .bind(period.id)
        .bind(BLOB)
        .execute(&pool)
        .await;

    assert!(result.is_err(), "signature on a non-completed period must fail");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_party_signature_is_unique_violation(pool: PgPool) {
    let period = open(&pool, "hash-1").await;

    PartySignatureRepo::insert(&pool, &signature(period.id, "alice"))
        .await
        .unwrap();
    let err = PartySignatureRepo::insert(&pool, &signature(period.id, "alice"))
        .await
        .unwrap_err();

    assert!(is_unique_violation(&err, UNIQUE_PERIOD_PARTY));
    assert!(!is_serialization_failure(&err));
    assert!(PartySignatureRepo::exists(&pool, period.id, "alice")
        .await
        .unwrap());
    assert_eq!(
        PartySignatureRepo::signed_parties(&pool, period.id).await.unwrap(),
        vec!["alice".to_string()]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_period_cascades_links_and_signatures(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    PartySigningLinkRepo::upsert(&pool, period.id, "alice", "link-alice", Utc::now() + Duration::days(30))
        .await
        .unwrap();
    PartySignatureRepo::insert(&pool, &signature(period.id, "alice"))
        .await
        .unwrap();

    assert!(SubmissionPeriodRepo::delete(&pool, period.id).await.unwrap());

    assert!(PartySigningLinkRepo::find_by_token_hash(&pool, "link-alice")
        .await
        .unwrap()
        .is_none());
    assert!(PartySignatureRepo::list_for_period(&pool, period.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reissued_link_replaces_token(pool: PgPool) {
    let period = open(&pool, "hash-1").await;
    let expires = Utc::now() + Duration::days(30);
    let first = PartySigningLinkRepo::upsert(&pool, period.id, "alice", "link-1", expires)
        .await
        .unwrap();
    let second = PartySigningLinkRepo::upsert(&pool, period.id, "alice", "link-2", expires)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(PartySigningLinkRepo::find_by_token_hash(&pool, "link-1")
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        PartySigningLinkRepo::list_for_period(&pool, period.id)
            .await
            .unwrap()
            .len(),
        1
    );
}
