//! Capability-token resolution.
//!
//! Resolution order is fixed: shape, lookup by digest, expiry. Expiry is
//! checked before the caller inspects any state, so an expired token fails
//! closed even when its subject is otherwise actionable.

use signoff_core::error::CoreError;
use signoff_core::tokens::{check_shape, ensure_fresh, hash_token, TokenSubject};
use signoff_core::types::Timestamp;
use signoff_db::models::party_signing_link::PartySigningLink;
use signoff_db::models::submission_period::SubmissionPeriod;
use signoff_db::repositories::{PartySigningLinkRepo, SubmissionPeriodRepo};
use sqlx::PgExecutor;

use crate::workflow::storage::storage_error;

/// Whether the resolved row should be locked until commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    None,
    ForUpdate,
}

/// Resolve a party signing token to its link.
pub async fn resolve_party_link<'e, E>(
    executor: E,
    token: &str,
    now: Timestamp,
) -> Result<PartySigningLink, CoreError>
where
    E: PgExecutor<'e>,
{
    let subject = TokenSubject::PartyLink;
    check_shape(token, subject)?;

    let link = PartySigningLinkRepo::find_by_token_hash(executor, &hash_token(token))
        .await
        .map_err(storage_error)?
        .ok_or_else(|| CoreError::not_found(subject.entity(), "token"))?;

    ensure_fresh(link.token_expires_at, now, subject)?;
    Ok(link)
}

/// Resolve a recipient token to its period.
pub async fn resolve_recipient<'e, E>(
    executor: E,
    token: &str,
    now: Timestamp,
    lock: Lock,
) -> Result<SubmissionPeriod, CoreError>
where
    E: PgExecutor<'e>,
{
    let subject = TokenSubject::Recipient;
    check_shape(token, subject)?;

    let hash = hash_token(token);
    let period = match lock {
        Lock::None => SubmissionPeriodRepo::find_by_token_hash(executor, &hash).await,
        Lock::ForUpdate => SubmissionPeriodRepo::find_by_token_hash_for_update(executor, &hash).await,
    }
    .map_err(storage_error)?
    .ok_or_else(|| CoreError::not_found(subject.entity(), "token"))?;

    ensure_fresh(period.token_expires_at, now, subject)?;
    Ok(period)
}
