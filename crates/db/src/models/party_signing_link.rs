//! Private signing links issued to individual parties.

use serde::Serialize;
use sqlx::FromRow;
use signoff_core::types::{DbId, Timestamp};

/// A row from the `party_signing_links` table.
///
/// Only the token digest is stored; the plaintext is returned once at issue.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PartySigningLink {
    pub id: DbId,
    pub period_id: DbId,
    pub party_id: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
