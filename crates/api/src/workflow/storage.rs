//! Translation of storage errors into the domain taxonomy.
//!
//! Raw `sqlx` errors never leave the workflow layer.

use signoff_core::error::CoreError;
use signoff_core::period::PeriodKey;
use signoff_core::tokens::IssuedToken;
use signoff_db::models::submission_period::SubmissionPeriod;
use signoff_db::repositories::SubmissionPeriodRepo;
use signoff_db::{begin_serializable, is_serialization_failure, DbPool, DbTransaction};
use sqlx::PgConnection;

/// Map a storage error to a [`CoreError`].
///
/// Serialization failures and deadlocks become
/// [`CoreError::TransientConflict`]; everything else is logged and becomes a
/// sanitized [`CoreError::Internal`].
pub fn storage_error(err: sqlx::Error) -> CoreError {
    if is_serialization_failure(&err) {
        tracing::debug!(error = %err, "Serialization conflict");
        return CoreError::TransientConflict("Concurrent update, please retry".into());
    }
    tracing::error!(error = %err, "Storage error");
    CoreError::Internal(format!("Storage error: {err}"))
}

/// Begin a serializable transaction, translating failures.
pub async fn begin(pool: &DbPool) -> Result<DbTransaction<'static>, CoreError> {
    begin_serializable(pool).await.map_err(storage_error)
}

/// Commit, translating a commit-time serialization failure into a retryable conflict.
pub async fn commit(tx: DbTransaction<'static>) -> Result<(), CoreError> {
    tx.commit().await.map_err(storage_error)
}

/// Load and lock the period for `key`, or fail with `NotFound`.
pub async fn lock_period(
    conn: &mut PgConnection,
    key: &PeriodKey,
) -> Result<SubmissionPeriod, CoreError> {
    SubmissionPeriodRepo::find_by_key_for_update(conn, key)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| CoreError::not_found("SubmissionPeriod", key.to_string()))
}

/// A recipient token minted inside a winning transition, together with the
/// period it was minted for. Handed to the notification gate after commit.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub period: SubmissionPeriod,
    pub token: IssuedToken,
}
