//! Repository for the `submission_periods` table.
//!
//! Every status-changing write is conditional on the expected prior status
//! and reports whether it affected a row. The caller that affected the row
//! owns the transition.

use sqlx::{PgConnection, PgExecutor};
use signoff_core::period::PeriodKey;
use signoff_core::submission::{
    STATUS_COMPLETED, STATUS_PENDING_EMPLOYEES, STATUS_PENDING_RECIPIENT,
};
use signoff_core::types::{DbId, Timestamp};

use crate::models::submission_period::{CreateSubmissionPeriod, SubmissionPeriod};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, group_key, month, year, status, recipient_email, recipient_name, \
    recipient_signature, recipient_signed_at, recipient_ip, token_hash, token_expires_at, \
    manual_override, override_note, document_ref, created_at, updated_at";

/// Provides lifecycle operations for submission periods.
pub struct SubmissionPeriodRepo;

impl SubmissionPeriodRepo {
    /// Create the period for `input.key` unless it already exists.
    ///
    /// Returns the period and whether this call created it. Concurrent callers
    /// racing on the same key all receive the single surviving row.
    pub async fn ensure(
        conn: &mut PgConnection,
        input: &CreateSubmissionPeriod,
    ) -> Result<(SubmissionPeriod, bool), sqlx::Error> {
        let insert = format!(
            "INSERT INTO submission_periods
                (group_key, month, year, recipient_email, recipient_name, token_hash, token_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (group_key, month, year) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, SubmissionPeriod>(&insert)
            .bind(&input.key.group_key)
            .bind(input.key.month)
            .bind(input.key.year)
            .bind(&input.recipient_email)
            .bind(&input.recipient_name)
            .bind(&input.token_hash)
            .bind(input.token_expires_at)
            .fetch_optional(&mut *conn)
            .await?;

        match created {
            Some(period) => Ok((period, true)),
            None => {
                let existing = Self::find_by_key(&mut *conn, &input.key)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((existing, false))
            }
        }
    }

    /// Find a period by its natural key.
    pub async fn find_by_key<'e, E>(
        executor: E,
        key: &PeriodKey,
    ) -> Result<Option<SubmissionPeriod>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM submission_periods
             WHERE group_key = $1 AND month = $2 AND year = $3"
        );
        sqlx::query_as::<_, SubmissionPeriod>(&query)
            .bind(&key.group_key)
            .bind(key.month)
            .bind(key.year)
            .fetch_optional(executor)
            .await
    }

    /// Find a period by its natural key and lock its row until commit.
    ///
    /// The period row is the serialization point for everything that reads
    /// signing progress and then writes status.
    pub async fn find_by_key_for_update<'e, E>(
        executor: E,
        key: &PeriodKey,
    ) -> Result<Option<SubmissionPeriod>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM submission_periods
             WHERE group_key = $1 AND month = $2 AND year = $3
             FOR UPDATE"
        );
        sqlx::query_as::<_, SubmissionPeriod>(&query)
            .bind(&key.group_key)
            .bind(key.month)
            .bind(key.year)
            .fetch_optional(executor)
            .await
    }

    /// Find a period by id.
    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<SubmissionPeriod>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM submission_periods WHERE id = $1");
        sqlx::query_as::<_, SubmissionPeriod>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a period by id and lock its row until commit.
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<SubmissionPeriod>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM submission_periods WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, SubmissionPeriod>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find the period whose recipient token digest is `token_hash`.
    pub async fn find_by_token_hash<'e, E>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<SubmissionPeriod>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM submission_periods WHERE token_hash = $1");
        sqlx::query_as::<_, SubmissionPeriod>(&query)
            .bind(token_hash)
            .fetch_optional(executor)
            .await
    }

    /// Like [`find_by_token_hash`](Self::find_by_token_hash), locking the row.
    pub async fn find_by_token_hash_for_update<'e, E>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<SubmissionPeriod>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM submission_periods WHERE token_hash = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, SubmissionPeriod>(&query)
            .bind(token_hash)
            .fetch_optional(executor)
            .await
    }

    /// Move `pending_employees -> pending_recipient` and install a fresh
    /// recipient token.
    ///
    /// `override_note` is `Some` for an admin-forced release. Returns `true`
    /// only for the caller whose update changed the row.
    pub async fn release_to_recipient<'e, E>(
        executor: E,
        id: DbId,
        token_hash: &str,
        token_expires_at: Timestamp,
        override_note: Option<&str>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE submission_periods SET
                status = $2,
                token_hash = $3,
                token_expires_at = $4,
                manual_override = ($5::TEXT IS NOT NULL),
                override_note = $5
             WHERE id = $1 AND status = $6",
        )
        .bind(id)
        .bind(STATUS_PENDING_RECIPIENT)
        .bind(token_hash)
        .bind(token_expires_at)
        .bind(override_note)
        .bind(STATUS_PENDING_EMPLOYEES)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the recipient signature and move `pending_recipient -> completed`.
    ///
    /// Guarded by both the prior status and the token digest, so a replayed
    /// or superseded token affects nothing.
    pub async fn complete<'e, E>(
        executor: E,
        id: DbId,
        token_hash: &str,
        signature_blob: &str,
        recipient_ip: Option<&str>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE submission_periods SET
                status = $4,
                recipient_signature = $2,
                recipient_signed_at = NOW(),
                recipient_ip = $3
             WHERE id = $1 AND status = $5 AND token_hash = $6",
        )
        .bind(id)
        .bind(signature_blob)
        .bind(recipient_ip)
        .bind(STATUS_COMPLETED)
        .bind(STATUS_PENDING_RECIPIENT)
        .bind(token_hash)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rewind a period to `pending_employees` with a new recipient token,
    /// clearing the recipient signature, manual override and document.
    pub async fn reset<'e, E>(
        executor: E,
        id: DbId,
        token_hash: &str,
        token_expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE submission_periods SET
                status = $2,
                recipient_signature = NULL,
                recipient_signed_at = NULL,
                recipient_ip = NULL,
                token_hash = $3,
                token_expires_at = $4,
                manual_override = false,
                override_note = NULL,
                document_ref = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(STATUS_PENDING_EMPLOYEES)
        .bind(token_hash)
        .bind(token_expires_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the recipient token, only while the period is in `status`.
    pub async fn reissue_token<'e, E>(
        executor: E,
        id: DbId,
        status: &str,
        token_hash: &str,
        token_expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE submission_periods SET token_hash = $3, token_expires_at = $4
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(status)
        .bind(token_hash)
        .bind(token_expires_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach the rendered document, only if the period is still completed.
    pub async fn set_document_ref<'e, E>(
        executor: E,
        id: DbId,
        document_ref: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE submission_periods SET document_ref = $2 WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(document_ref)
        .bind(STATUS_COMPLETED)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the per-period recipient override.
    pub async fn set_recipient_override<'e, E>(
        executor: E,
        id: DbId,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE submission_periods SET recipient_email = $2, recipient_name = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a period. Links and signatures cascade.
    pub async fn delete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM submission_periods WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
