//! Repository for the `submission_events` audit table.

use sqlx::PgExecutor;
use signoff_core::types::DbId;

use crate::models::submission_event::{CreateSubmissionEvent, SubmissionEventRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, event_type, period_id, group_key, month, year, actor, payload, created_at";

/// Provides write and read operations for audit events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert<'e, E>(
        executor: E,
        input: &CreateSubmissionEvent<'_>,
    ) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "INSERT INTO submission_events
                (event_type, period_id, group_key, month, year, actor, payload)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(input.event_type)
        .bind(input.period_id)
        .bind(input.group_key)
        .bind(input.month)
        .bind(input.year)
        .bind(input.actor)
        .bind(input.payload)
        .fetch_one(executor)
        .await
    }

    /// List the events of a period, oldest first.
    pub async fn list_for_period<'e, E>(
        executor: E,
        period_id: DbId,
    ) -> Result<Vec<SubmissionEventRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM submission_events WHERE period_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, SubmissionEventRow>(&query)
            .bind(period_id)
            .fetch_all(executor)
            .await
    }
}
