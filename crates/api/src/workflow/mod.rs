//! The sign-off workflow.
//!
//! Every write runs as one `SERIALIZABLE` transaction that locks the period
//! row, re-reads what it needs, applies a conditional write and commits. The
//! whole attempt is re-run by [`retry::with_retry`] on a serialization
//! conflict. Side effects that cannot be rolled back (notification, document
//! rendering, event publication) run only after the commit, and only for the
//! caller whose conditional write affected the row.
//!
//! - [`ledger`] -- party signing, required-signer projection, hand-off.
//! - [`recipient`] -- recipient signing and completion.
//! - [`gate`] -- the one-shot recipient notification.
//! - [`reset`] / [`cleanup`] -- administrative undo and orphan removal.
//! - [`admin`] -- period creation, link issuance, release, resend, status.

pub mod admin;
pub mod cleanup;
pub mod gate;
pub mod ledger;
pub mod recipient;
pub mod render;
pub mod reset;
pub mod retry;
pub mod storage;
pub mod tokens;

use serde::Serialize;
use signoff_core::types::{DbId, Timestamp};
use signoff_db::models::submission_period::SubmissionPeriod;
use signoff_db::models::work_record::WorkRecord;

/// Period fields shown to signers and admins.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    pub status: String,
}

impl From<&SubmissionPeriod> for PeriodSummary {
    fn from(period: &SubmissionPeriod) -> Self {
        Self {
            group_key: period.group_key.clone(),
            month: period.month,
            year: period.year,
            status: period.status.clone(),
        }
    }
}

/// A work record as shown on a signing page.
#[derive(Debug, Clone, Serialize)]
pub struct RecordLine {
    pub id: DbId,
    pub party_id: String,
    pub work_date: chrono::NaiveDate,
    pub status: String,
    pub updated_at: Timestamp,
}

impl From<WorkRecord> for RecordLine {
    fn from(record: WorkRecord) -> Self {
        Self {
            id: record.id,
            party_id: record.party_id,
            work_date: record.work_date,
            status: record.status,
            updated_at: record.updated_at,
        }
    }
}
