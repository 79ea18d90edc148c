//! Repository for the `group_recipients` table.

use sqlx::PgExecutor;

use crate::models::group_recipient::{GroupRecipient, UpsertGroupRecipient};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "group_key, email, display_name, created_at, updated_at";

/// Provides read/write operations for group default recipients.
pub struct GroupRecipientRepo;

impl GroupRecipientRepo {
    /// Set the default recipient of a group, replacing any previous one.
    pub async fn upsert<'e, E>(
        executor: E,
        group_key: &str,
        input: &UpsertGroupRecipient,
    ) -> Result<GroupRecipient, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO group_recipients (group_key, email, display_name)
             VALUES ($1, $2, $3)
             ON CONFLICT (group_key) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GroupRecipient>(&query)
            .bind(group_key)
            .bind(&input.email)
            .bind(&input.display_name)
            .fetch_one(executor)
            .await
    }

    /// Find the default recipient of a group.
    pub async fn find<'e, E>(
        executor: E,
        group_key: &str,
    ) -> Result<Option<GroupRecipient>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM group_recipients WHERE group_key = $1");
        sqlx::query_as::<_, GroupRecipient>(&query)
            .bind(group_key)
            .fetch_optional(executor)
            .await
    }
}
