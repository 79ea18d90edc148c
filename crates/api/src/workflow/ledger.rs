//! Party signing: ledger insert, required-signer projection and hand-off.
//!
//! One signing attempt is a single serializable transaction:
//!
//! 1. resolve the party link and lock the period row;
//! 2. re-verify "already signed" and the period status;
//! 3. insert the signature and flip the party's records to `submitted`;
//! 4. recount required versus signed from fresh reads;
//! 5. if complete, conditionally move the period to `pending_recipient`
//!    with a fresh recipient token.
//!
//! Only the attempt whose conditional update affected the row returns a
//! [`Handoff`], and only that caller runs the notification gate.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use signoff_core::error::CoreError;
use signoff_core::period::PeriodKey;
use signoff_core::progress::SigningProgress;
use signoff_core::signature::validate_signature_blob;
use signoff_core::submission::{SubmissionStatus, Transition};
use signoff_core::tokens;
use signoff_core::types::{DbId, Timestamp};
use signoff_db::models::party_signature::CreatePartySignature;
use signoff_db::models::submission_period::SubmissionPeriod;
use signoff_db::is_unique_violation;
use signoff_db::repositories::party_signature_repo::UNIQUE_PERIOD_PARTY;
use signoff_db::repositories::{PartySignatureRepo, SubmissionPeriodRepo, WorkRecordRepo};
use signoff_events::bus::{EVENT_PARTY_SIGNED, EVENT_READY_FOR_RECIPIENT};
use signoff_events::SignoffEvent;
use sqlx::PgConnection;

use crate::state::AppState;
use crate::workflow::gate::{self, NotificationStatus};
use crate::workflow::retry::with_retry;
use crate::workflow::storage::{self, storage_error, Handoff};
use crate::workflow::tokens::resolve_party_link;
use crate::workflow::{PeriodSummary, RecordLine};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Response body of a successful party signature.
#[derive(Debug, Clone, Serialize)]
pub struct PartySignResult {
    pub party_id: String,
    pub all_signed: bool,
    pub signed_count: usize,
    pub total_count: usize,
    pub status: SubmissionStatus,
    pub notification: NotificationStatus,
}

/// What a party sees before signing.
#[derive(Debug, Clone, Serialize)]
pub struct PartySigningContext {
    pub party_id: String,
    pub period: PeriodSummary,
    pub records: Vec<RecordLine>,
    pub progress: SigningProgress,
    /// Whether the period currently accepts this party's signature.
    pub can_sign: bool,
    pub token_expires_at: Timestamp,
}

/// The committed outcome of one signing attempt.
struct LedgerEntry {
    period: SubmissionPeriod,
    party_id: String,
    progress: SigningProgress,
    status: SubmissionStatus,
    handoff: Option<Handoff>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Load the signing context behind a party token.
///
/// A party that already signed gets `AlreadyConsumed`.
pub async fn party_context(state: &AppState, token: &str) -> Result<PartySigningContext, CoreError> {
    let mut conn = state.pool.acquire().await.map_err(storage_error)?;
    let link = resolve_party_link(&mut *conn, token, Utc::now()).await?;

    let period = SubmissionPeriodRepo::find_by_id(&mut *conn, link.period_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| CoreError::not_found("SubmissionPeriod", link.period_id.to_string()))?;

    if PartySignatureRepo::exists(&mut *conn, period.id, &link.party_id)
        .await
        .map_err(storage_error)?
    {
        return Err(CoreError::AlreadyConsumed(format!(
            "Party '{}' has already signed {}",
            link.party_id,
            period.key()
        )));
    }

    let key = period.key();
    let records = WorkRecordRepo::list_for_party(&mut *conn, &key, &link.party_id)
        .await
        .map_err(storage_error)?;
    let progress = project_progress(&mut *conn, &key, period.id).await?;
    let can_sign = period.status()?.accepts_party_signatures();

    Ok(PartySigningContext {
        party_id: link.party_id,
        period: PeriodSummary::from(&period),
        records: records.into_iter().map(RecordLine::from).collect(),
        progress,
        can_sign,
        token_expires_at: link.token_expires_at,
    })
}

/// Record a party's signature and, if it completes the required set, hand
/// the period on to the recipient.
pub async fn sign_as_party(
    state: &AppState,
    token: &str,
    signature_blob: &str,
    origin_ip: Option<&str>,
) -> Result<PartySignResult, CoreError> {
    validate_signature_blob(signature_blob).map_err(CoreError::Validation)?;

    let entry = with_retry("sign_as_party", move || {
        attempt_sign(state, token, signature_blob, origin_ip)
    })
    .await?;

    let key = entry.period.key();
    tracing::info!(
        period_id = entry.period.id,
        period = %key,
        party_id = %entry.party_id,
        signed = entry.progress.signed,
        total = entry.progress.total,
        "Party signed"
    );
    state.event_bus.publish(
        SignoffEvent::new(EVENT_PARTY_SIGNED)
            .for_period(entry.period.id, key.clone())
            .with_actor(entry.party_id.clone())
            .with_payload(json!({
                "signed": entry.progress.signed,
                "total": entry.progress.total,
            })),
    );

    let notification = match &entry.handoff {
        Some(handoff) => {
            tracing::info!(
                period_id = entry.period.id,
                period = %key,
                "All parties signed, awaiting recipient"
            );
            state.event_bus.publish(
                SignoffEvent::new(EVENT_READY_FOR_RECIPIENT)
                    .for_period(entry.period.id, key)
                    .with_actor(entry.party_id.clone()),
            );
            gate::notify_recipient(state, handoff).await
        }
        None => NotificationStatus::NotRequired,
    };

    Ok(PartySignResult {
        party_id: entry.party_id,
        all_signed: entry.progress.is_complete(),
        signed_count: entry.progress.signed,
        total_count: entry.progress.total,
        status: entry.status,
        notification,
    })
}

async fn attempt_sign(
    state: &AppState,
    token: &str,
    signature_blob: &str,
    origin_ip: Option<&str>,
) -> Result<LedgerEntry, CoreError> {
    let now = Utc::now();
    let mut tx = storage::begin(&state.pool).await?;

    let link = resolve_party_link(&mut *tx, token, now).await?;
    let period = SubmissionPeriodRepo::find_by_id_for_update(&mut *tx, link.period_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| CoreError::not_found("SubmissionPeriod", link.period_id.to_string()))?;
    let key = period.key();
    let party_id = link.party_id.clone();

    if PartySignatureRepo::exists(&mut *tx, period.id, &party_id)
        .await
        .map_err(storage_error)?
    {
        return Err(already_signed(&party_id, &period));
    }

    let status = period.status()?;
    if !status.accepts_party_signatures() {
        return Err(CoreError::InvalidState(format!(
            "{key} is '{status}' and no longer accepts party signatures"
        )));
    }

    let required: BTreeSet<String> = WorkRecordRepo::required_parties(&mut *tx, &key)
        .await
        .map_err(storage_error)?
        .into_iter()
        .collect();
    if !required.contains(&party_id) {
        return Err(CoreError::InvalidState(format!(
            "Party '{party_id}' has no active work records in {key}"
        )));
    }

    let insert = CreatePartySignature {
        period_id: period.id,
        party_id: party_id.clone(),
        signature_blob: signature_blob.to_string(),
        origin_ip: origin_ip.map(str::to_string),
        token_hash: link.token_hash.clone(),
        token_expires_at: link.token_expires_at,
    };
    if let Err(e) = PartySignatureRepo::insert(&mut *tx, &insert).await {
        if is_unique_violation(&e, UNIQUE_PERIOD_PARTY) {
            return Err(already_signed(&party_id, &period));
        }
        return Err(storage_error(e));
    }

    WorkRecordRepo::mark_party_submitted(&mut *tx, &key, &party_id)
        .await
        .map_err(storage_error)?;

    let progress = progress_within(&mut *tx, &required, period.id).await?;

    let (status, handoff) = if progress.is_complete() {
        let next = status.apply(Transition::AllEmployeesSigned)?;
        let recipient_token = tokens::issue(state.config.signing.recipient_token_ttl(), now);
        let owned = SubmissionPeriodRepo::release_to_recipient(
            &mut *tx,
            period.id,
            &recipient_token.hash,
            recipient_token.expires_at,
            None,
        )
        .await
        .map_err(storage_error)?;

        // The period row is locked and was pending_employees above.
        if !owned {
            return Err(CoreError::Internal(format!(
                "Hand-off of {key} affected no row while the period was locked"
            )));
        }
        (
            next,
            Some(Handoff {
                period: period.clone(),
                token: recipient_token,
            }),
        )
    } else {
        (status, None)
    };

    storage::commit(tx).await?;

    Ok(LedgerEntry {
        period,
        party_id,
        progress,
        status,
        handoff,
    })
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Progress of a period, computed from the current records and ledger.
pub async fn project_progress(
    conn: &mut PgConnection,
    key: &PeriodKey,
    period_id: DbId,
) -> Result<SigningProgress, CoreError> {
    let required: BTreeSet<String> = WorkRecordRepo::required_parties(&mut *conn, key)
        .await
        .map_err(storage_error)?
        .into_iter()
        .collect();
    progress_within(conn, &required, period_id).await
}

async fn progress_within(
    conn: &mut PgConnection,
    required: &BTreeSet<String>,
    period_id: DbId,
) -> Result<SigningProgress, CoreError> {
    let signed: BTreeSet<String> = PartySignatureRepo::signed_parties(&mut *conn, period_id)
        .await
        .map_err(storage_error)?
        .into_iter()
        .collect();
    Ok(SigningProgress::project(required, &signed))
}

fn already_signed(party_id: &str, period: &SubmissionPeriod) -> CoreError {
    CoreError::AlreadySigned(format!(
        "Party '{party_id}' has already signed {}",
        period.key()
    ))
}
