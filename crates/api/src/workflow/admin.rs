//! Administrative actions on submission periods.
//!
//! Opening periods, issuing party links, manual release, recipient resend,
//! the status view and group recipient defaults. Reset and bulk delete live
//! in [`reset`](super::reset) and [`cleanup`](super::cleanup).

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use signoff_core::contact::validate_contact;
use signoff_core::error::CoreError;
use signoff_core::period::{PeriodKey, MAX_GROUP_KEY_LENGTH};
use signoff_core::progress::SigningProgress;
use signoff_core::submission::{SubmissionStatus, Transition, STATUS_PENDING_RECIPIENT};
use signoff_core::tokens::{self, signing_url, TokenSubject};
use signoff_core::types::Timestamp;
use signoff_db::models::group_recipient::{GroupRecipient, UpsertGroupRecipient};
use signoff_db::models::party_signature::SignatureSummary;
use signoff_db::models::submission_period::{CreateSubmissionPeriod, SubmissionPeriod};
use signoff_db::repositories::{
    GroupRecipientRepo, PartySignatureRepo, PartySigningLinkRepo, SubmissionPeriodRepo,
    WorkRecordRepo,
};
use signoff_events::bus::{EVENT_OPENED, EVENT_READY_FOR_RECIPIENT, EVENT_RELEASED};
use signoff_events::SignoffEvent;
use sqlx::PgConnection;

use crate::state::AppState;
use crate::workflow::gate::{self, NotificationStatus};
use crate::workflow::retry::with_retry;
use crate::workflow::storage::{self, lock_period, storage_error, Handoff};

/// Maximum length of a manual-release note.
pub const MAX_OVERRIDE_NOTE_LENGTH: usize = 2000;

// ---------------------------------------------------------------------------
// Inputs and results
// ---------------------------------------------------------------------------

/// Per-period recipient supplied when opening a period.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipientOverride {
    pub email: String,
    pub display_name: String,
}

/// Result of opening a period.
#[derive(Debug, Clone, Serialize)]
pub struct OpenedPeriod {
    pub created: bool,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub status: SubmissionStatus,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
}

/// A freshly issued party signing link. The URL is shown exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedLink {
    pub party_id: String,
    pub signing_url: String,
    pub expires_at: Timestamp,
}

/// Result of a manual release or a recipient resend.
#[derive(Debug, Clone, Serialize)]
pub struct HandoffResult {
    pub status: SubmissionStatus,
    pub manual_override: bool,
    pub token_expires_at: Timestamp,
    pub notification: NotificationStatus,
}

/// Everything an admin needs to see about one period.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub status: SubmissionStatus,
    pub progress: SigningProgress,
    pub required_parties: Vec<String>,
    pub signatures: Vec<SignatureSummary>,
    pub manual_override: bool,
    pub override_note: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_signed_at: Option<Timestamp>,
    pub token_expires_at: Option<Timestamp>,
    pub document_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

/// Create the period for `key` if it does not exist yet.
///
/// A supplied recipient override is applied whether or not the period was
/// just created.
pub async fn open_period(
    state: &AppState,
    key: &PeriodKey,
    recipient: Option<&RecipientOverride>,
    actor: &str,
) -> Result<OpenedPeriod, CoreError> {
    if let Some(r) = recipient {
        validate_contact(&r.email, &r.display_name).map_err(CoreError::Validation)?;
    }

    let (period, created) = with_retry("open_period", move || attempt_open(state, key, recipient)).await?;

    if created {
        publish_opened(state, &period, actor);
    }

    Ok(OpenedPeriod {
        created,
        group_key: period.group_key.clone(),
        month: period.month,
        year: period.year,
        status: period.status()?,
        recipient_email: period.recipient_email,
        recipient_name: period.recipient_name,
    })
}

async fn attempt_open(
    state: &AppState,
    key: &PeriodKey,
    recipient: Option<&RecipientOverride>,
) -> Result<(SubmissionPeriod, bool), CoreError> {
    let mut tx = storage::begin(&state.pool).await?;
    let (mut period, created) = ensure_period(&mut *tx, state, key, recipient).await?;

    if !created {
        if let Some(r) = recipient {
            SubmissionPeriodRepo::set_recipient_override(
                &mut *tx,
                period.id,
                Some(&r.email),
                Some(&r.display_name),
            )
            .await
            .map_err(storage_error)?;
            period.recipient_email = Some(r.email.clone());
            period.recipient_name = Some(r.display_name.clone());
        }
    }

    storage::commit(tx).await?;
    Ok((period, created))
}

/// Insert-or-fetch the period row, minting the placeholder recipient token a
/// new period starts with.
async fn ensure_period(
    conn: &mut PgConnection,
    state: &AppState,
    key: &PeriodKey,
    recipient: Option<&RecipientOverride>,
) -> Result<(SubmissionPeriod, bool), CoreError> {
    let token = tokens::issue(state.config.signing.recipient_token_ttl(), Utc::now());
    let input = CreateSubmissionPeriod {
        key: key.clone(),
        recipient_email: recipient.map(|r| r.email.clone()),
        recipient_name: recipient.map(|r| r.display_name.clone()),
        token_hash: token.hash,
        token_expires_at: token.expires_at,
    };
    SubmissionPeriodRepo::ensure(conn, &input)
        .await
        .map_err(storage_error)
}

fn publish_opened(state: &AppState, period: &SubmissionPeriod, actor: &str) {
    tracing::info!(period_id = period.id, period = %period.key(), actor, "Submission period opened");
    state.event_bus.publish(
        SignoffEvent::new(EVENT_OPENED)
            .for_period(period.id, period.key())
            .with_actor(actor),
    );
}

// ---------------------------------------------------------------------------
// Party links
// ---------------------------------------------------------------------------

/// Issue (or reissue) private signing links for parties of a period.
///
/// Creates the period on first use. With `parties == None` every currently
/// required party gets a link; named parties must be required. Reissuing
/// invalidates the party's previous link.
pub async fn issue_party_links(
    state: &AppState,
    key: &PeriodKey,
    parties: Option<&[String]>,
    actor: &str,
) -> Result<Vec<IssuedLink>, CoreError> {
    let (period, created, links) =
        with_retry("issue_party_links", move || attempt_issue_links(state, key, parties)).await?;

    if created {
        publish_opened(state, &period, actor);
    }
    tracing::info!(
        period_id = period.id,
        period = %key,
        links = links.len(),
        actor,
        "Party signing links issued"
    );

    Ok(links)
}

async fn attempt_issue_links(
    state: &AppState,
    key: &PeriodKey,
    parties: Option<&[String]>,
) -> Result<(SubmissionPeriod, bool, Vec<IssuedLink>), CoreError> {
    let now = Utc::now();
    let mut tx = storage::begin(&state.pool).await?;

    let (_, created) = ensure_period(&mut *tx, state, key, None).await?;
    let period = lock_period(&mut *tx, key).await?;

    let status = period.status()?;
    if !status.accepts_party_signatures() {
        return Err(CoreError::InvalidState(format!(
            "{key} is '{status}'; party links can only be issued while parties are signing"
        )));
    }

    let required: BTreeSet<String> = WorkRecordRepo::required_parties(&mut *tx, key)
        .await
        .map_err(storage_error)?
        .into_iter()
        .collect();
    if required.is_empty() {
        return Err(CoreError::Validation(format!(
            "{key} has no active work records"
        )));
    }

    let targets: Vec<String> = match parties {
        Some(named) => {
            if named.is_empty() {
                return Err(CoreError::Validation("parties must not be empty".into()));
            }
            if let Some(stranger) = named.iter().find(|p| !required.contains(*p)) {
                return Err(CoreError::Validation(format!(
                    "Party '{stranger}' has no active work records in {key}"
                )));
            }
            named
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
        None => required.into_iter().collect(),
    };

    let mut links = Vec::with_capacity(targets.len());
    for party_id in targets {
        let token = tokens::issue(state.config.signing.party_token_ttl(), now);
        PartySigningLinkRepo::upsert(&mut *tx, period.id, &party_id, &token.hash, token.expires_at)
            .await
            .map_err(storage_error)?;
        links.push(IssuedLink {
            signing_url: signing_url(
                &state.config.signing.base_url,
                TokenSubject::PartyLink,
                &token.plaintext,
            ),
            expires_at: token.expires_at,
            party_id,
        });
    }

    storage::commit(tx).await?;
    Ok((period, created, links))
}

// ---------------------------------------------------------------------------
// Manual release and resend
// ---------------------------------------------------------------------------

/// Force `pending_employees -> pending_recipient` regardless of progress.
///
/// The note is mandatory and stored with the override flag.
pub async fn release(
    state: &AppState,
    key: &PeriodKey,
    note: &str,
    actor: &str,
) -> Result<HandoffResult, CoreError> {
    let note = note.trim();
    if note.is_empty() {
        return Err(CoreError::Validation("note must not be empty".into()));
    }
    if note.len() > MAX_OVERRIDE_NOTE_LENGTH {
        return Err(CoreError::Validation(format!(
            "note must be at most {MAX_OVERRIDE_NOTE_LENGTH} characters"
        )));
    }

    let handoff = with_retry("release", move || attempt_release(state, key, note)).await?;

    tracing::info!(period_id = handoff.period.id, period = %key, actor, "Submission manually released");
    state.event_bus.publish(
        SignoffEvent::new(EVENT_RELEASED)
            .for_period(handoff.period.id, key.clone())
            .with_actor(actor)
            .with_payload(json!({ "note": note })),
    );
    state.event_bus.publish(
        SignoffEvent::new(EVENT_READY_FOR_RECIPIENT)
            .for_period(handoff.period.id, key.clone())
            .with_actor(actor),
    );

    let notification = gate::notify_recipient(state, &handoff).await;

    Ok(HandoffResult {
        status: SubmissionStatus::PendingRecipient,
        manual_override: true,
        token_expires_at: handoff.token.expires_at,
        notification,
    })
}

async fn attempt_release(state: &AppState, key: &PeriodKey, note: &str) -> Result<Handoff, CoreError> {
    let mut tx = storage::begin(&state.pool).await?;
    let period = lock_period(&mut *tx, key).await?;
    period.status()?.apply(Transition::ManualRelease)?;

    let token = tokens::issue(state.config.signing.recipient_token_ttl(), Utc::now());
    let owned = SubmissionPeriodRepo::release_to_recipient(
        &mut *tx,
        period.id,
        &token.hash,
        token.expires_at,
        Some(note),
    )
    .await
    .map_err(storage_error)?;
    if !owned {
        return Err(CoreError::InvalidState(format!(
            "{key} was released concurrently"
        )));
    }

    storage::commit(tx).await?;
    Ok(Handoff { period, token })
}

/// Mint a new recipient token and notify the recipient again.
///
/// Only valid while the period awaits the recipient. The previous recipient
/// link stops working.
pub async fn resend_recipient(
    state: &AppState,
    key: &PeriodKey,
    actor: &str,
) -> Result<HandoffResult, CoreError> {
    let handoff = with_retry("resend_recipient", move || attempt_resend(state, key)).await?;

    tracing::info!(period_id = handoff.period.id, period = %key, actor, "Recipient link reissued");
    let notification = gate::notify_recipient(state, &handoff).await;

    Ok(HandoffResult {
        status: SubmissionStatus::PendingRecipient,
        manual_override: handoff.period.manual_override,
        token_expires_at: handoff.token.expires_at,
        notification,
    })
}

async fn attempt_resend(state: &AppState, key: &PeriodKey) -> Result<Handoff, CoreError> {
    let mut tx = storage::begin(&state.pool).await?;
    let period = lock_period(&mut *tx, key).await?;

    let status = period.status()?;
    if !status.accepts_recipient_signature() {
        return Err(CoreError::InvalidState(format!(
            "{key} is '{status}'; the recipient link can only be resent while awaiting the recipient"
        )));
    }

    let token = tokens::issue(state.config.signing.recipient_token_ttl(), Utc::now());
    let reissued = SubmissionPeriodRepo::reissue_token(
        &mut *tx,
        period.id,
        STATUS_PENDING_RECIPIENT,
        &token.hash,
        token.expires_at,
    )
    .await
    .map_err(storage_error)?;
    if !reissued {
        return Err(CoreError::InvalidState(format!(
            "{key} left '{status}' concurrently"
        )));
    }

    storage::commit(tx).await?;
    Ok(Handoff { period, token })
}

// ---------------------------------------------------------------------------
// Status view
// ---------------------------------------------------------------------------

/// Status, progress and signers of a period. A period without a row is
/// reported as `not_started`, with the required set it would have.
pub async fn status_view(state: &AppState, key: &PeriodKey) -> Result<StatusView, CoreError> {
    let mut conn = state.pool.acquire().await.map_err(storage_error)?;

    let required: BTreeSet<String> = WorkRecordRepo::required_parties(&mut *conn, key)
        .await
        .map_err(storage_error)?
        .into_iter()
        .collect();

    let Some(period) = SubmissionPeriodRepo::find_by_key(&mut *conn, key)
        .await
        .map_err(storage_error)?
    else {
        return Ok(StatusView {
            group_key: key.group_key.clone(),
            month: key.month,
            year: key.year,
            status: SubmissionStatus::NotStarted,
            progress: SigningProgress::project(&required, &BTreeSet::new()),
            required_parties: required.into_iter().collect(),
            signatures: Vec::new(),
            manual_override: false,
            override_note: None,
            recipient_email: None,
            recipient_name: None,
            recipient_signed_at: None,
            token_expires_at: None,
            document_ref: None,
        });
    };

    let signatures = PartySignatureRepo::list_summaries(&mut *conn, period.id)
        .await
        .map_err(storage_error)?;
    let signed: BTreeSet<String> = signatures.iter().map(|s| s.party_id.clone()).collect();

    Ok(StatusView {
        status: period.status()?,
        progress: SigningProgress::project(&required, &signed),
        required_parties: required.into_iter().collect(),
        signatures,
        group_key: period.group_key,
        month: period.month,
        year: period.year,
        manual_override: period.manual_override,
        override_note: period.override_note,
        recipient_email: period.recipient_email,
        recipient_name: period.recipient_name,
        recipient_signed_at: period.recipient_signed_at,
        token_expires_at: Some(period.token_expires_at),
        document_ref: period.document_ref,
    })
}

// ---------------------------------------------------------------------------
// Group recipients
// ---------------------------------------------------------------------------

/// Set the default recipient for every period of `group_key`.
pub async fn set_group_recipient(
    state: &AppState,
    group_key: &str,
    input: &UpsertGroupRecipient,
    actor: &str,
) -> Result<GroupRecipient, CoreError> {
    let group_key = group_key.trim();
    if group_key.is_empty() || group_key.len() > MAX_GROUP_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "group_key must be between 1 and {MAX_GROUP_KEY_LENGTH} characters"
        )));
    }
    validate_contact(&input.email, &input.display_name).map_err(CoreError::Validation)?;

    let recipient = GroupRecipientRepo::upsert(&state.pool, group_key, input)
        .await
        .map_err(storage_error)?;

    tracing::info!(group_key, actor, "Group recipient updated");
    Ok(recipient)
}
