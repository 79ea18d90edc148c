//! Persisted audit events.

use serde::Serialize;
use sqlx::FromRow;
use signoff_core::types::{DbId, Timestamp};

/// A row from the `submission_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubmissionEventRow {
    pub id: DbId,
    pub event_type: String,
    pub period_id: Option<DbId>,
    pub group_key: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub actor: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting an audit event.
#[derive(Debug, Clone)]
pub struct CreateSubmissionEvent<'a> {
    pub event_type: &'a str,
    pub period_id: Option<DbId>,
    pub group_key: Option<&'a str>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub actor: Option<&'a str>,
    pub payload: &'a serde_json::Value,
}
