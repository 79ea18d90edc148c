//! Recipient signing: the `pending_recipient -> completed` transition.
//!
//! The completion write is guarded by both the prior status and the token
//! digest, so a replayed token affects nothing. Document rendering runs after
//! commit and its failure never undoes completion.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use signoff_core::error::CoreError;
use signoff_core::progress::SigningProgress;
use signoff_core::signature::validate_signature_blob;
use signoff_core::submission::{SubmissionStatus, Transition};
use signoff_core::types::Timestamp;
use signoff_db::models::party_signature::SignatureSummary;
use signoff_db::models::submission_period::SubmissionPeriod;
use signoff_db::repositories::{PartySignatureRepo, SubmissionPeriodRepo, WorkRecordRepo};
use signoff_events::bus::EVENT_COMPLETED;
use signoff_events::SignoffEvent;

use crate::state::AppState;
use crate::workflow::ledger::project_progress;
use crate::workflow::render::DocumentSnapshot;
use crate::workflow::retry::with_retry;
use crate::workflow::storage::{self, storage_error};
use crate::workflow::tokens::{resolve_recipient, Lock};
use crate::workflow::{PeriodSummary, RecordLine};

/// What the recipient sees before signing.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientSigningContext {
    pub period: PeriodSummary,
    pub recipient_name: Option<String>,
    pub records: Vec<RecordLine>,
    pub signatures: Vec<SignatureSummary>,
    pub progress: SigningProgress,
    pub manual_override: bool,
    pub override_note: Option<String>,
    pub token_expires_at: Timestamp,
}

/// Response body of a successful recipient signature.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientSignResult {
    pub success: bool,
    pub status: SubmissionStatus,
    /// `None` when rendering failed; the completion stands regardless.
    pub document_ref: Option<String>,
}

/// Load the signing context behind a recipient token.
///
/// A completed period yields `AlreadyConsumed`; a period still waiting for
/// parties yields `InvalidState`.
pub async fn recipient_context(
    state: &AppState,
    token: &str,
) -> Result<RecipientSigningContext, CoreError> {
    let mut conn = state.pool.acquire().await.map_err(storage_error)?;
    let period = resolve_recipient(&mut *conn, token, Utc::now(), Lock::None).await?;

    match period.status()? {
        SubmissionStatus::PendingRecipient => {}
        SubmissionStatus::Completed => {
            return Err(CoreError::AlreadyConsumed(format!(
                "{} has already been countersigned",
                period.key()
            )))
        }
        other => return Err(employees_pending(&period, other)),
    }

    let key = period.key();
    let records = WorkRecordRepo::list_for_period(&mut *conn, &key)
        .await
        .map_err(storage_error)?;
    let signatures = PartySignatureRepo::list_summaries(&mut *conn, period.id)
        .await
        .map_err(storage_error)?;
    let progress = project_progress(&mut *conn, &key, period.id).await?;

    Ok(RecipientSigningContext {
        period: PeriodSummary::from(&period),
        recipient_name: period.recipient_name.clone(),
        records: records.into_iter().map(RecordLine::from).collect(),
        signatures,
        progress,
        manual_override: period.manual_override,
        override_note: period.override_note.clone(),
        token_expires_at: period.token_expires_at,
    })
}

/// Record the recipient's signature and complete the period.
pub async fn sign_as_recipient(
    state: &AppState,
    token: &str,
    signature_blob: &str,
    origin_ip: Option<&str>,
) -> Result<RecipientSignResult, CoreError> {
    validate_signature_blob(signature_blob).map_err(CoreError::Validation)?;

    let period = with_retry("sign_as_recipient", move || {
        attempt_complete(state, token, signature_blob, origin_ip)
    })
    .await?;

    let key = period.key();
    tracing::info!(period_id = period.id, period = %key, "Recipient signed, period completed");
    state.event_bus.publish(
        SignoffEvent::new(EVENT_COMPLETED)
            .for_period(period.id, key)
            .with_actor("recipient")
            .with_payload(json!({ "manual_override": period.manual_override })),
    );

    let document_ref = render_document(state, &period).await;

    Ok(RecipientSignResult {
        success: true,
        status: SubmissionStatus::Completed,
        document_ref,
    })
}

async fn attempt_complete(
    state: &AppState,
    token: &str,
    signature_blob: &str,
    origin_ip: Option<&str>,
) -> Result<SubmissionPeriod, CoreError> {
    let mut tx = storage::begin(&state.pool).await?;
    let period = resolve_recipient(&mut *tx, token, Utc::now(), Lock::ForUpdate).await?;

    match period.status()? {
        SubmissionStatus::Completed => return Err(already_countersigned(&period)),
        SubmissionStatus::PendingRecipient => {}
        other => return Err(employees_pending(&period, other)),
    }
    period.status()?.apply(Transition::RecipientSigned)?;

    let completed = SubmissionPeriodRepo::complete(
        &mut *tx,
        period.id,
        &period.token_hash,
        signature_blob,
        origin_ip,
    )
    .await
    .map_err(storage_error)?;
    if !completed {
        return Err(already_countersigned(&period));
    }

    WorkRecordRepo::mark_period_completed(&mut *tx, &period.key())
        .await
        .map_err(storage_error)?;

    storage::commit(tx).await?;
    Ok(period)
}

/// Render and attach the document of a freshly completed period.
///
/// Returns the stored reference, or `None` if rendering failed or a reset
/// got there first.
async fn render_document(state: &AppState, period: &SubmissionPeriod) -> Option<String> {
    let snapshot = match load_snapshot(state, period).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(period_id = period.id, error = %e, "Failed to load document snapshot");
            return None;
        }
    };

    let document_ref = match state.renderer.render(&snapshot).await {
        Ok(document_ref) => document_ref,
        Err(e) => {
            tracing::warn!(period_id = period.id, error = %e, "Document rendering failed");
            return None;
        }
    };

    match SubmissionPeriodRepo::set_document_ref(&state.pool, period.id, &document_ref).await {
        Ok(true) => Some(document_ref),
        Ok(false) => {
            tracing::info!(period_id = period.id, "Period left completed before document was attached");
            None
        }
        Err(e) => {
            tracing::warn!(period_id = period.id, error = %e, "Failed to store document reference");
            None
        }
    }
}

async fn load_snapshot(
    state: &AppState,
    period: &SubmissionPeriod,
) -> Result<DocumentSnapshot, sqlx::Error> {
    let reloaded = SubmissionPeriodRepo::find_by_id(&state.pool, period.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let records = WorkRecordRepo::list_for_period(&state.pool, &reloaded.key()).await?;
    let signatures = PartySignatureRepo::list_summaries(&state.pool, reloaded.id).await?;

    Ok(DocumentSnapshot {
        period_id: reloaded.id,
        group_key: reloaded.group_key,
        month: reloaded.month,
        year: reloaded.year,
        recipient_name: reloaded.recipient_name,
        recipient_signed_at: reloaded.recipient_signed_at,
        manual_override: reloaded.manual_override,
        records: records.into_iter().map(RecordLine::from).collect(),
        signatures,
    })
}

fn already_countersigned(period: &SubmissionPeriod) -> CoreError {
    CoreError::AlreadySigned(format!("{} has already been countersigned", period.key()))
}

fn employees_pending(period: &SubmissionPeriod, status: SubmissionStatus) -> CoreError {
    CoreError::InvalidState(format!(
        "{} is '{status}'; parties have not finished signing",
        period.key()
    ))
}
