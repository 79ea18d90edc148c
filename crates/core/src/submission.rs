//! Submission period lifecycle: status enum and transition table.
//!
//! Statuses are persisted as snake_case text. `NotStarted` is virtual: it is
//! what a period is before its row exists and is never written to storage.
//!
//! ```text
//! NotStarted --Open--> PendingEmployees --AllEmployeesSigned--> PendingRecipient
//!                                       --ManualRelease------->
//! PendingRecipient --RecipientSigned--> Completed
//! PendingEmployees | PendingRecipient | Completed --Reset--> PendingEmployees
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_NOT_STARTED: &str = "not_started";
pub const STATUS_PENDING_EMPLOYEES: &str = "pending_employees";
pub const STATUS_PENDING_RECIPIENT: &str = "pending_recipient";
pub const STATUS_COMPLETED: &str = "completed";

/// Lifecycle status of a submission period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    NotStarted,
    PendingEmployees,
    PendingRecipient,
    Completed,
}

/// Every state change a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The period row is created.
    Open,
    /// The last required party signed.
    AllEmployeesSigned,
    /// An admin forced the period on to the recipient.
    ManualRelease,
    /// The external recipient signed.
    RecipientSigned,
    /// An admin stripped all signatures.
    Reset,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::NotStarted => STATUS_NOT_STARTED,
            SubmissionStatus::PendingEmployees => STATUS_PENDING_EMPLOYEES,
            SubmissionStatus::PendingRecipient => STATUS_PENDING_RECIPIENT,
            SubmissionStatus::Completed => STATUS_COMPLETED,
        }
    }

    /// Look up `transition` in the transition table.
    ///
    /// Any pair not present in the table is rejected with
    /// [`CoreError::InvalidState`].
    pub fn apply(self, transition: Transition) -> Result<SubmissionStatus, CoreError> {
        use SubmissionStatus::*;
        use Transition::*;

        let next = match (self, transition) {
            (NotStarted, Open) => PendingEmployees,
            (PendingEmployees, AllEmployeesSigned) => PendingRecipient,
            (PendingEmployees, ManualRelease) => PendingRecipient,
            (PendingRecipient, RecipientSigned) => Completed,
            (PendingEmployees | PendingRecipient | Completed, Reset) => PendingEmployees,
            (from, t) => {
                return Err(CoreError::InvalidState(format!(
                    "Cannot apply {t:?} to a submission in status '{from}'"
                )))
            }
        };
        Ok(next)
    }

    /// Whether parties may still add signatures.
    pub fn accepts_party_signatures(self) -> bool {
        self == SubmissionStatus::PendingEmployees
    }

    /// Whether the recipient may sign.
    pub fn accepts_recipient_signature(self) -> bool {
        self == SubmissionStatus::PendingRecipient
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_NOT_STARTED => Ok(SubmissionStatus::NotStarted),
            STATUS_PENDING_EMPLOYEES => Ok(SubmissionStatus::PendingEmployees),
            STATUS_PENDING_RECIPIENT => Ok(SubmissionStatus::PendingRecipient),
            STATUS_COMPLETED => Ok(SubmissionStatus::Completed),
            other => Err(CoreError::Internal(format!(
                "Unknown submission status '{other}'"
            ))),
        }
    }
}
