//! Per-party signature ledger entries.

use serde::Serialize;
use sqlx::FromRow;
use signoff_core::types::{DbId, Timestamp};

/// A row from the `party_signatures` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PartySignature {
    pub id: DbId,
    pub period_id: DbId,
    pub party_id: String,
    #[serde(skip_serializing)]
    pub signature_blob: String,
    pub signed_at: Timestamp,
    pub origin_ip: Option<String>,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for appending a signature to the ledger.
///
/// The token fields record which signing link authorised the signature.
#[derive(Debug, Clone)]
pub struct CreatePartySignature {
    pub period_id: DbId,
    pub party_id: String,
    pub signature_blob: String,
    pub origin_ip: Option<String>,
    pub token_hash: String,
    pub token_expires_at: Timestamp,
}

/// Who signed and when, without the signature image.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SignatureSummary {
    pub party_id: String,
    pub signed_at: Timestamp,
}
