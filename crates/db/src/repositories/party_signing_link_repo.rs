//! Repository for the `party_signing_links` table.

use sqlx::PgExecutor;
use signoff_core::types::{DbId, Timestamp};

use crate::models::party_signing_link::PartySigningLink;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, period_id, party_id, token_hash, token_expires_at, created_at, updated_at";

/// Provides issue and lookup operations for party signing links.
pub struct PartySigningLinkRepo;

impl PartySigningLinkRepo {
    /// Issue or reissue the link for `(period_id, party_id)`.
    ///
    /// Reissuing overwrites the previous token, which stops resolving.
    pub async fn upsert<'e, E>(
        executor: E,
        period_id: DbId,
        party_id: &str,
        token_hash: &str,
        token_expires_at: Timestamp,
    ) -> Result<PartySigningLink, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO party_signing_links (period_id, party_id, token_hash, token_expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (period_id, party_id) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                token_expires_at = EXCLUDED.token_expires_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PartySigningLink>(&query)
            .bind(period_id)
            .bind(party_id)
            .bind(token_hash)
            .bind(token_expires_at)
            .fetch_one(executor)
            .await
    }

    /// Find the link whose token digest is `token_hash`.
    pub async fn find_by_token_hash<'e, E>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<PartySigningLink>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM party_signing_links WHERE token_hash = $1");
        sqlx::query_as::<_, PartySigningLink>(&query)
            .bind(token_hash)
            .fetch_optional(executor)
            .await
    }

    /// List all links of a period, ordered by party.
    pub async fn list_for_period<'e, E>(
        executor: E,
        period_id: DbId,
    ) -> Result<Vec<PartySigningLink>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM party_signing_links WHERE period_id = $1 ORDER BY party_id"
        );
        sqlx::query_as::<_, PartySigningLink>(&query)
            .bind(period_id)
            .fetch_all(executor)
            .await
    }
}
