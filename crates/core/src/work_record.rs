//! Work record status values and the side-effect rules that move them.
//!
//! A work record only reaches `submitted` when its party signs, and only
//! reaches `completed` when its period completes. Reset rewinds both to
//! `confirmed`. Cancelled records never take part in sign-off.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a single work record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkRecordStatus {
    Planned,
    Confirmed,
    Changed,
    Submitted,
    Completed,
    Cancelled,
}

impl WorkRecordStatus {
    pub const ALL: [WorkRecordStatus; 6] = [
        WorkRecordStatus::Planned,
        WorkRecordStatus::Confirmed,
        WorkRecordStatus::Changed,
        WorkRecordStatus::Submitted,
        WorkRecordStatus::Completed,
        WorkRecordStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkRecordStatus::Planned => "planned",
            WorkRecordStatus::Confirmed => "confirmed",
            WorkRecordStatus::Changed => "changed",
            WorkRecordStatus::Submitted => "submitted",
            WorkRecordStatus::Completed => "completed",
            WorkRecordStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a record in this status makes its party a required signer.
    pub fn counts_toward_required(self) -> bool {
        self != WorkRecordStatus::Cancelled
    }

    /// Whether a party signature moves this record to `submitted`.
    pub fn is_pre_submission(self) -> bool {
        matches!(
            self,
            WorkRecordStatus::Planned | WorkRecordStatus::Confirmed | WorkRecordStatus::Changed
        )
    }

    /// Whether a reset rewinds this record to `confirmed`.
    pub fn is_rewound_by_reset(self) -> bool {
        matches!(self, WorkRecordStatus::Submitted | WorkRecordStatus::Completed)
    }
}

/// Status text values that a party signature moves to `submitted`.
pub fn pre_submission_statuses() -> Vec<&'static str> {
    statuses_where(WorkRecordStatus::is_pre_submission)
}

/// Status text values that make a party a required signer.
pub fn required_statuses() -> Vec<&'static str> {
    statuses_where(WorkRecordStatus::counts_toward_required)
}

/// Status text values that a reset rewinds to `confirmed`.
pub fn reset_statuses() -> Vec<&'static str> {
    statuses_where(WorkRecordStatus::is_rewound_by_reset)
}

fn statuses_where(pred: impl Fn(WorkRecordStatus) -> bool) -> Vec<&'static str> {
    WorkRecordStatus::ALL
        .into_iter()
        .filter(|s| pred(*s))
        .map(WorkRecordStatus::as_str)
        .collect()
}

impl fmt::Display for WorkRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkRecordStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkRecordStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown work record status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_the_only_excluded_status() {
        assert_eq!(required_statuses().len(), 5);
        assert!(!required_statuses().contains(&"cancelled"));
    }

    #[test]
    fn signing_moves_only_pre_submission_records() {
        assert_eq!(pre_submission_statuses(), vec!["planned", "confirmed", "changed"]);
    }

    #[test]
    fn reset_rewinds_submitted_and_completed() {
        assert_eq!(reset_statuses(), vec!["submitted", "completed"]);
    }

    #[test]
    fn parses_known_statuses() {
        assert_eq!("changed".parse::<WorkRecordStatus>().unwrap(), WorkRecordStatus::Changed);
        assert!("archived".parse::<WorkRecordStatus>().is_err());
    }
}
