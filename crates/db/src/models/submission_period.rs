//! Submission periods: the monthly unit of multi-party approval.

use serde::Serialize;
use sqlx::FromRow;
use signoff_core::error::CoreError;
use signoff_core::period::PeriodKey;
use signoff_core::submission::SubmissionStatus;
use signoff_core::types::{DbId, Timestamp};

use crate::models::group_recipient::GroupRecipient;

/// A row from the `submission_periods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubmissionPeriod {
    pub id: DbId,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub status: String,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    #[serde(skip_serializing)]
    pub recipient_signature: Option<String>,
    pub recipient_signed_at: Option<Timestamp>,
    pub recipient_ip: Option<String>,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_expires_at: Timestamp,
    pub manual_override: bool,
    pub override_note: Option<String>,
    pub document_ref: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubmissionPeriod {
    /// Parse the stored status text.
    pub fn status(&self) -> Result<SubmissionStatus, CoreError> {
        self.status.parse()
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            group_key: self.group_key.clone(),
            month: self.month,
            year: self.year,
        }
    }

    /// Resolve who receives the recipient link.
    ///
    /// A per-period override wins over the group default.
    pub fn recipient_contact(&self, group_default: Option<&GroupRecipient>) -> Option<RecipientContact> {
        if let Some(email) = &self.recipient_email {
            return Some(RecipientContact {
                email: email.clone(),
                display_name: self
                    .recipient_name
                    .clone()
                    .unwrap_or_else(|| email.clone()),
            });
        }
        group_default.map(|g| RecipientContact {
            email: g.email.clone(),
            display_name: g.display_name.clone(),
        })
    }
}

/// Email address and display name of the external recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientContact {
    pub email: String,
    pub display_name: String,
}

/// DTO for opening a period.
#[derive(Debug, Clone)]
pub struct CreateSubmissionPeriod {
    pub key: PeriodKey,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub token_hash: String,
    pub token_expires_at: Timestamp,
}
