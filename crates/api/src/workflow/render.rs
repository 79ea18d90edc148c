//! Document rendering collaborator.
//!
//! The human-readable document is produced elsewhere. The service only needs
//! a stable reference to it, stored on the period once it completes.

use async_trait::async_trait;
use serde::Serialize;
use signoff_core::hashing::sha256_hex;
use signoff_core::types::{DbId, Timestamp};
use signoff_db::models::party_signature::SignatureSummary;

use crate::workflow::RecordLine;

/// Everything the document of a completed period is rendered from.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSnapshot {
    pub period_id: DbId,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub recipient_name: Option<String>,
    pub recipient_signed_at: Option<Timestamp>,
    pub manual_override: bool,
    pub records: Vec<RecordLine>,
    pub signatures: Vec<SignatureSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Rendering failed: {0}")]
    Failed(String),
}

/// Produces a document reference for a completed period.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, snapshot: &DocumentSnapshot) -> Result<String, RenderError>;
}

/// Content-addressed renderer: the reference is `sha256:<hex>` of the
/// snapshot's JSON encoding.
#[derive(Debug, Default, Clone)]
pub struct ContentHashRenderer;

#[async_trait]
impl DocumentRenderer for ContentHashRenderer {
    async fn render(&self, snapshot: &DocumentSnapshot) -> Result<String, RenderError> {
        let bytes = serde_json::to_vec(snapshot)?;
        Ok(format!("sha256:{}", sha256_hex(&bytes)))
    }
}
