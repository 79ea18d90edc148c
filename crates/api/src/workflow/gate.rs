//! The recipient notification gate.
//!
//! Called once, after commit, by the caller that owned the hand-off
//! transition (or by an explicit admin resend). It never fails: the outcome
//! is reported as a [`NotificationStatus`] and recorded as an audit event.

use serde::Serialize;
use serde_json::json;
use signoff_core::tokens::{signing_url, TokenSubject};
use signoff_db::models::submission_period::RecipientContact;
use signoff_db::repositories::GroupRecipientRepo;
use signoff_events::bus::{EVENT_RECIPIENT_NOTIFIED, EVENT_RECIPIENT_NOTIFY_FAILED};
use signoff_events::{RecipientNotice, SignoffEvent};

use crate::state::AppState;
use crate::workflow::storage::Handoff;

/// Outcome of the downstream notification attached to a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// This call did not own a hand-off.
    NotRequired,
    Sent,
    /// The write is durable but the recipient could not be told.
    Failed,
}

/// Notify the recipient of `handoff`.
pub async fn notify_recipient(state: &AppState, handoff: &Handoff) -> NotificationStatus {
    let period = &handoff.period;
    let key = period.key();

    let contact = match resolve_contact(state, handoff).await {
        Ok(Some(contact)) => contact,
        Ok(None) => {
            tracing::warn!(period_id = period.id, period = %key, "No recipient contact configured");
            return record_failure(state, handoff, "no recipient contact configured");
        }
        Err(e) => {
            tracing::warn!(period_id = period.id, error = %e, "Failed to load recipient contact");
            return record_failure(state, handoff, "recipient contact lookup failed");
        }
    };

    let notice = RecipientNotice {
        email: contact.email.clone(),
        display_name: contact.display_name,
        period: key.clone(),
        signing_url: signing_url(
            &state.config.signing.base_url,
            TokenSubject::Recipient,
            &handoff.token.plaintext,
        ),
        expires_at: handoff.token.expires_at,
    };

    match state.notifier.notify_recipient(&notice).await {
        Ok(()) => {
            tracing::info!(period_id = period.id, period = %key, "Recipient notified");
            state.event_bus.publish(
                SignoffEvent::new(EVENT_RECIPIENT_NOTIFIED)
                    .for_period(period.id, key)
                    .with_payload(json!({ "email": contact.email })),
            );
            NotificationStatus::Sent
        }
        Err(e) => {
            tracing::warn!(period_id = period.id, error = %e, "Recipient notification failed");
            record_failure(state, handoff, &e.to_string())
        }
    }
}

async fn resolve_contact(
    state: &AppState,
    handoff: &Handoff,
) -> Result<Option<RecipientContact>, sqlx::Error> {
    let period = &handoff.period;
    if period.recipient_email.is_some() {
        return Ok(period.recipient_contact(None));
    }
    let group_default = GroupRecipientRepo::find(&state.pool, &period.group_key).await?;
    Ok(period.recipient_contact(group_default.as_ref()))
}

fn record_failure(state: &AppState, handoff: &Handoff, reason: &str) -> NotificationStatus {
    state.event_bus.publish(
        SignoffEvent::new(EVENT_RECIPIENT_NOTIFY_FAILED)
            .for_period(handoff.period.id, handoff.period.key())
            .with_payload(json!({ "reason": reason })),
    );
    NotificationStatus::Failed
}
