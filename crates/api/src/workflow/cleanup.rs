//! Bulk deletion of work records and period reconciliation.
//!
//! The reconciliation runs in the same transaction as the deletion it reacts
//! to, so no crash can leave a period without backing work. A delete that
//! shrinks the required-signer set down to parties who already signed hands
//! the period to the recipient exactly as the last signature would have.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use signoff_core::error::CoreError;
use signoff_core::period::PeriodKey;
use signoff_core::submission::{SubmissionStatus, Transition};
use signoff_core::tokens;
use signoff_core::types::{DbId, Timestamp};
use signoff_db::repositories::{SubmissionPeriodRepo, WorkRecordRepo};
use signoff_events::bus::{EVENT_READY_FOR_RECIPIENT, EVENT_REMOVED};
use signoff_events::SignoffEvent;
use sqlx::PgConnection;

use crate::state::AppState;
use crate::workflow::gate::{self, NotificationStatus};
use crate::workflow::ledger::project_progress;
use crate::workflow::retry::with_retry;
use crate::workflow::storage::{self, storage_error, Handoff};

/// Upper bound on ids accepted by one bulk delete.
pub const MAX_BULK_DELETE: usize = 1000;

/// A period removed because its last work record was deleted.
#[derive(Debug, Clone, Serialize)]
pub struct RemovedPeriod {
    pub period_id: DbId,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
}

/// A period moved to `pending_recipient` because every party left after the
/// delete had already signed.
#[derive(Debug, Clone, Serialize)]
pub struct HandedOffPeriod {
    pub period_id: DbId,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub notification: NotificationStatus,
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteSummary {
    pub deleted_count: usize,
    pub removed_periods: Vec<RemovedPeriod>,
    pub handed_off: Vec<HandedOffPeriod>,
}

/// What [`reconcile_on_bulk_delete`] did to the affected periods.
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub removed: Vec<RemovedPeriod>,
    /// Hand-offs owned by this transaction, to be notified after commit.
    pub handoffs: Vec<Handoff>,
}

/// The committed outcome of one bulk delete attempt.
struct Deletion {
    deleted_count: usize,
    reconciliation: Reconciliation,
}

/// Delete the given work records and reconcile the periods they belonged to.
///
/// Periods left without records are removed. Periods whose remaining
/// required parties have all signed are handed to the recipient, and the
/// recipient is notified once the deletion has committed. Unknown ids fail
/// the whole call with `NotFound` and nothing is deleted.
pub async fn bulk_delete(
    state: &AppState,
    record_ids: &[DbId],
    actor: &str,
) -> Result<BulkDeleteSummary, CoreError> {
    if record_ids.is_empty() {
        return Err(CoreError::Validation("record_ids must not be empty".into()));
    }
    if record_ids.len() > MAX_BULK_DELETE {
        return Err(CoreError::Validation(format!(
            "At most {MAX_BULK_DELETE} record ids per request"
        )));
    }
    let unique: Vec<DbId> = record_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let ids = unique.as_slice();

    let Deletion {
        deleted_count,
        reconciliation,
    } = with_retry("bulk_delete", move || attempt_bulk_delete(state, ids)).await?;

    tracing::info!(
        deleted = deleted_count,
        removed_periods = reconciliation.removed.len(),
        handed_off = reconciliation.handoffs.len(),
        actor,
        "Work records deleted"
    );
    for removed in &reconciliation.removed {
        let key = PeriodKey {
            group_key: removed.group_key.clone(),
            month: removed.month,
            year: removed.year,
        };
        tracing::info!(period_id = removed.period_id, period = %key, "Orphaned period removed");
        state.event_bus.publish(
            SignoffEvent::new(EVENT_REMOVED)
                .for_period(removed.period_id, key)
                .with_actor(actor)
                .with_payload(json!({ "reason": "no work records remain" })),
        );
    }

    let mut handed_off = Vec::with_capacity(reconciliation.handoffs.len());
    for handoff in &reconciliation.handoffs {
        let period = &handoff.period;
        tracing::info!(
            period_id = period.id,
            period = %period.key(),
            "Remaining parties already signed, awaiting recipient"
        );
        state.event_bus.publish(
            SignoffEvent::new(EVENT_READY_FOR_RECIPIENT)
                .for_period(period.id, period.key())
                .with_actor(actor)
                .with_payload(json!({ "reason": "work records deleted" })),
        );
        let notification = gate::notify_recipient(state, handoff).await;
        handed_off.push(HandedOffPeriod {
            period_id: period.id,
            group_key: period.group_key.clone(),
            month: period.month,
            year: period.year,
            notification,
        });
    }

    Ok(BulkDeleteSummary {
        deleted_count,
        removed_periods: reconciliation.removed,
        handed_off,
    })
}

async fn attempt_bulk_delete(state: &AppState, ids: &[DbId]) -> Result<Deletion, CoreError> {
    let mut tx = storage::begin(&state.pool).await?;

    let deleted = WorkRecordRepo::delete_by_ids(&mut *tx, ids)
        .await
        .map_err(storage_error)?;

    if deleted.len() != ids.len() {
        let found: BTreeSet<DbId> = deleted.iter().map(|r| r.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(ToString::to_string)
            .collect();
        return Err(CoreError::not_found("WorkRecord", missing.join(", ")));
    }

    let affected: BTreeSet<PeriodKey> = deleted.iter().map(|r| r.period_key()).collect();
    let reconciliation = reconcile_on_bulk_delete(
        &mut *tx,
        &affected,
        state.config.signing.recipient_token_ttl(),
        Utc::now(),
    )
    .await?;

    storage::commit(tx).await?;

    Ok(Deletion {
        deleted_count: deleted.len(),
        reconciliation,
    })
}

/// Reconcile each affected period with the records that remain.
///
/// A period with no records left is deleted. A `pending_employees` period
/// whose remaining required parties have all signed moves to
/// `pending_recipient` with a fresh recipient token.
///
/// Must be called inside the transaction that deleted the records. Keys are
/// visited in sorted order so concurrent callers lock periods consistently.
pub async fn reconcile_on_bulk_delete(
    conn: &mut PgConnection,
    affected: &BTreeSet<PeriodKey>,
    recipient_ttl: chrono::Duration,
    now: Timestamp,
) -> Result<Reconciliation, CoreError> {
    let mut outcome = Reconciliation::default();

    for key in affected {
        let Some(period) = SubmissionPeriodRepo::find_by_key_for_update(&mut *conn, key)
            .await
            .map_err(storage_error)?
        else {
            continue;
        };

        let remaining = WorkRecordRepo::count_for_period(&mut *conn, key)
            .await
            .map_err(storage_error)?;

        if remaining == 0 {
            if SubmissionPeriodRepo::delete(&mut *conn, period.id)
                .await
                .map_err(storage_error)?
            {
                outcome.removed.push(RemovedPeriod {
                    period_id: period.id,
                    group_key: period.group_key,
                    month: period.month,
                    year: period.year,
                });
            }
            continue;
        }

        let status = period.status()?;
        if status != SubmissionStatus::PendingEmployees {
            continue;
        }
        let progress = project_progress(&mut *conn, key, period.id).await?;
        if !progress.is_complete() {
            continue;
        }

        status.apply(Transition::AllEmployeesSigned)?;
        let recipient_token = tokens::issue(recipient_ttl, now);
        let owned = SubmissionPeriodRepo::release_to_recipient(
            &mut *conn,
            period.id,
            &recipient_token.hash,
            recipient_token.expires_at,
            None,
        )
        .await
        .map_err(storage_error)?;
        if !owned {
            return Err(CoreError::Internal(format!(
                "Hand-off of {key} affected no row while the period was locked"
            )));
        }
        outcome.handoffs.push(Handoff {
            period,
            token: recipient_token,
        });
    }

    Ok(outcome)
}
