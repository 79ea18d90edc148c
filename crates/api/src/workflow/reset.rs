//! Administrative reset: strip every signature and rewind to `pending_employees`.
//!
//! All of it happens in one transaction. Either everything below commits or
//! nothing does; a half-reset period is never observable.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use signoff_core::error::CoreError;
use signoff_core::period::PeriodKey;
use signoff_core::submission::{SubmissionStatus, Transition};
use signoff_core::tokens;
use signoff_core::types::DbId;
use signoff_db::repositories::{PartySignatureRepo, SubmissionPeriodRepo, WorkRecordRepo};
use signoff_events::bus::EVENT_RESET;
use signoff_events::SignoffEvent;

use crate::state::AppState;
use crate::workflow::retry::with_retry;
use crate::workflow::storage::{self, lock_period, storage_error};

/// Counts of what a reset cleared.
#[derive(Debug, Clone, Serialize)]
pub struct ResetSummary {
    #[serde(skip_serializing)]
    pub period_id: DbId,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub previous_status: SubmissionStatus,
    pub status: SubmissionStatus,
    pub signatures_cleared: u64,
    pub records_reverted: u64,
    pub recipient_signature_cleared: bool,
    pub document_cleared: bool,
}

/// Reset the period at `key`.
///
/// Deletes all party signatures, installs a new recipient token, clears the
/// recipient signature, manual override and document reference, and rewinds
/// `submitted`/`completed` records to `confirmed`.
pub async fn reset(state: &AppState, key: &PeriodKey, actor: &str) -> Result<ResetSummary, CoreError> {
    let summary = with_retry("reset", move || attempt_reset(state, key)).await?;

    tracing::info!(
        period_id = summary.period_id,
        period = %key,
        previous_status = %summary.previous_status,
        signatures_cleared = summary.signatures_cleared,
        records_reverted = summary.records_reverted,
        actor,
        "Submission reset"
    );
    state.event_bus.publish(
        SignoffEvent::new(EVENT_RESET)
            .for_period(summary.period_id, key.clone())
            .with_actor(actor)
            .with_payload(json!({
                "previous_status": summary.previous_status,
                "signatures_cleared": summary.signatures_cleared,
                "records_reverted": summary.records_reverted,
            })),
    );

    Ok(summary)
}

async fn attempt_reset(state: &AppState, key: &PeriodKey) -> Result<ResetSummary, CoreError> {
    let mut tx = storage::begin(&state.pool).await?;
    let period = lock_period(&mut *tx, key).await?;

    let previous_status = period.status()?;
    let status = previous_status.apply(Transition::Reset)?;

    let signatures_cleared = PartySignatureRepo::delete_for_period(&mut *tx, period.id)
        .await
        .map_err(storage_error)?;

    let recipient_token = tokens::issue(state.config.signing.recipient_token_ttl(), Utc::now());
    let rewound = SubmissionPeriodRepo::reset(
        &mut *tx,
        period.id,
        &recipient_token.hash,
        recipient_token.expires_at,
    )
    .await
    .map_err(storage_error)?;
    if !rewound {
        return Err(CoreError::not_found("SubmissionPeriod", key.to_string()));
    }

    let records_reverted = WorkRecordRepo::revert_period(&mut *tx, key)
        .await
        .map_err(storage_error)?;

    storage::commit(tx).await?;

    Ok(ResetSummary {
        period_id: period.id,
        group_key: period.group_key,
        month: period.month,
        year: period.year,
        previous_status,
        status,
        signatures_cleared,
        records_reverted,
        recipient_signature_cleared: period.recipient_signature.is_some(),
        document_cleared: period.document_ref.is_some(),
    })
}
