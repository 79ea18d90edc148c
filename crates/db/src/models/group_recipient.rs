//! Default recipient contact per group.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use signoff_core::types::Timestamp;

/// A row from the `group_recipients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupRecipient {
    pub group_key: String,
    pub email: String,
    pub display_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for setting a group's default recipient.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertGroupRecipient {
    pub email: String,
    pub display_name: String,
}
