//! Repository for the `party_signatures` ledger.
//!
//! The ledger is append-only: rows are inserted when a party signs and
//! deleted en masse by a reset. Uniqueness of `(period_id, party_id)` is
//! enforced by [`UNIQUE_PERIOD_PARTY`] in storage.

use sqlx::PgExecutor;
use signoff_core::types::DbId;

use crate::models::party_signature::{CreatePartySignature, PartySignature, SignatureSummary};

/// Name of the unique constraint on `(period_id, party_id)`.
pub const UNIQUE_PERIOD_PARTY: &str = "uq_party_signatures_period_party";

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, period_id, party_id, signature_blob, signed_at, origin_ip, \
    token_hash, token_expires_at, created_at";

/// Provides ledger operations for party signatures.
pub struct PartySignatureRepo;

impl PartySignatureRepo {
    /// Append a signature. Fails with a unique violation on
    /// [`UNIQUE_PERIOD_PARTY`] if the party already signed this period.
    pub async fn insert<'e, E>(
        executor: E,
        input: &CreatePartySignature,
    ) -> Result<PartySignature, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO party_signatures
                (period_id, party_id, signature_blob, origin_ip, token_hash, token_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PartySignature>(&query)
            .bind(input.period_id)
            .bind(&input.party_id)
            .bind(&input.signature_blob)
            .bind(&input.origin_ip)
            .bind(&input.token_hash)
            .bind(input.token_expires_at)
            .fetch_one(executor)
            .await
    }

    /// Whether `party_id` has signed the period.
    pub async fn exists<'e, E>(
        executor: E,
        period_id: DbId,
        party_id: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM party_signatures WHERE period_id = $1 AND party_id = $2
             )",
        )
        .bind(period_id)
        .bind(party_id)
        .fetch_one(executor)
        .await
    }

    /// Every party that has signed the period.
    pub async fn signed_parties<'e, E>(
        executor: E,
        period_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT party_id FROM party_signatures WHERE period_id = $1 ORDER BY party_id",
        )
        .bind(period_id)
        .fetch_all(executor)
        .await
    }

    /// Who signed and when, in signing order.
    pub async fn list_summaries<'e, E>(
        executor: E,
        period_id: DbId,
    ) -> Result<Vec<SignatureSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, SignatureSummary>(
            "SELECT party_id, signed_at FROM party_signatures
             WHERE period_id = $1
             ORDER BY signed_at ASC, id ASC",
        )
        .bind(period_id)
        .fetch_all(executor)
        .await
    }

    /// Full signature rows, including images, in signing order.
    pub async fn list_for_period<'e, E>(
        executor: E,
        period_id: DbId,
    ) -> Result<Vec<PartySignature>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM party_signatures
             WHERE period_id = $1
             ORDER BY signed_at ASC, id ASC"
        );
        sqlx::query_as::<_, PartySignature>(&query)
            .bind(period_id)
            .fetch_all(executor)
            .await
    }

    /// Delete every signature of a period. Returns the count removed.
    pub async fn delete_for_period<'e, E>(executor: E, period_id: DbId) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM party_signatures WHERE period_id = $1")
            .bind(period_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
