//! Repository for the `work_records` table.
//!
//! Besides plain CRUD this is where the required-signer projection is read
//! and where status side effects of signing, completion and reset land.

use chrono::Datelike;
use sqlx::PgExecutor;
use signoff_core::period::PeriodKey;
use signoff_core::types::DbId;
use signoff_core::work_record::{
    pre_submission_statuses, required_statuses, reset_statuses, WorkRecordStatus,
};

use crate::models::work_record::{CreateWorkRecord, DeletedWorkRecord, WorkRecord};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, group_key, party_id, work_date, month, year, status, created_at, updated_at";

/// Provides CRUD and projection queries for work records.
pub struct WorkRecordRepo;

impl WorkRecordRepo {
    /// Insert a new work record, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateWorkRecord) -> Result<WorkRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO work_records (group_key, party_id, work_date, month, year, status)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'planned'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkRecord>(&query)
            .bind(&input.group_key)
            .bind(&input.party_id)
            .bind(input.work_date)
            .bind(input.work_date.month() as i32)
            .bind(input.work_date.year())
            .bind(&input.status)
            .fetch_one(executor)
            .await
    }

    /// Find a work record by its ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<WorkRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM work_records WHERE id = $1");
        sqlx::query_as::<_, WorkRecord>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List every record of a period, ordered by date then party.
    pub async fn list_for_period<'e, E>(
        executor: E,
        key: &PeriodKey,
    ) -> Result<Vec<WorkRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM work_records
             WHERE group_key = $1 AND month = $2 AND year = $3
             ORDER BY work_date ASC, party_id ASC, id ASC"
        );
        sqlx::query_as::<_, WorkRecord>(&query)
            .bind(&key.group_key)
            .bind(key.month)
            .bind(key.year)
            .fetch_all(executor)
            .await
    }

    /// List one party's records of a period, ordered by date.
    pub async fn list_for_party<'e, E>(
        executor: E,
        key: &PeriodKey,
        party_id: &str,
    ) -> Result<Vec<WorkRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM work_records
             WHERE group_key = $1 AND month = $2 AND year = $3 AND party_id = $4
             ORDER BY work_date ASC, id ASC"
        );
        sqlx::query_as::<_, WorkRecord>(&query)
            .bind(&key.group_key)
            .bind(key.month)
            .bind(key.year)
            .bind(party_id)
            .fetch_all(executor)
            .await
    }

    /// The required-signer set: distinct parties with at least one record
    /// whose status counts toward sign-off.
    pub async fn required_parties<'e, E>(
        executor: E,
        key: &PeriodKey,
    ) -> Result<Vec<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT DISTINCT party_id FROM work_records
             WHERE group_key = $1 AND month = $2 AND year = $3 AND status = ANY($4)
             ORDER BY party_id",
        )
        .bind(&key.group_key)
        .bind(key.month)
        .bind(key.year)
        .bind(required_statuses())
        .fetch_all(executor)
        .await
    }

    /// Count all records of a period, whatever their status.
    pub async fn count_for_period<'e, E>(executor: E, key: &PeriodKey) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM work_records
             WHERE group_key = $1 AND month = $2 AND year = $3",
        )
        .bind(&key.group_key)
        .bind(key.month)
        .bind(key.year)
        .fetch_one(executor)
        .await
    }

    /// Move one party's pre-submission records to `submitted`.
    pub async fn mark_party_submitted<'e, E>(
        executor: E,
        key: &PeriodKey,
        party_id: &str,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE work_records SET status = $5
             WHERE group_key = $1 AND month = $2 AND year = $3 AND party_id = $4
               AND status = ANY($6)",
        )
        .bind(&key.group_key)
        .bind(key.month)
        .bind(key.year)
        .bind(party_id)
        .bind(WorkRecordStatus::Submitted.as_str())
        .bind(pre_submission_statuses())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move every `submitted` record of a period to `completed`.
    pub async fn mark_period_completed<'e, E>(executor: E, key: &PeriodKey) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE work_records SET status = $4
             WHERE group_key = $1 AND month = $2 AND year = $3 AND status = $5",
        )
        .bind(&key.group_key)
        .bind(key.month)
        .bind(key.year)
        .bind(WorkRecordStatus::Completed.as_str())
        .bind(WorkRecordStatus::Submitted.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Rewind `submitted`/`completed` records of a period to `confirmed`.
    pub async fn revert_period<'e, E>(executor: E, key: &PeriodKey) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE work_records SET status = $4
             WHERE group_key = $1 AND month = $2 AND year = $3 AND status = ANY($5)",
        )
        .bind(&key.group_key)
        .bind(key.month)
        .bind(key.year)
        .bind(WorkRecordStatus::Confirmed.as_str())
        .bind(reset_statuses())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete the given records, returning the period key of each one removed.
    pub async fn delete_by_ids<'e, E>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<DeletedWorkRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, DeletedWorkRecord>(
            "DELETE FROM work_records WHERE id = ANY($1)
             RETURNING id, group_key, month, year",
        )
        .bind(ids)
        .fetch_all(executor)
        .await
    }
}
