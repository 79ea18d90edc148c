//! Work records: one per party per working day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use signoff_core::error::CoreError;
use signoff_core::period::PeriodKey;
use signoff_core::types::{DbId, Timestamp};
use signoff_core::work_record::WorkRecordStatus;

/// A row from the `work_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkRecord {
    pub id: DbId,
    pub group_key: String,
    pub party_id: String,
    pub work_date: NaiveDate,
    pub month: i32,
    pub year: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkRecord {
    /// Parse the stored status text.
    pub fn status(&self) -> Result<WorkRecordStatus, CoreError> {
        self.status.parse()
    }
}

/// DTO for inserting a work record. Month and year derive from `work_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkRecord {
    pub group_key: String,
    pub party_id: String,
    pub work_date: NaiveDate,
    pub status: Option<String>,
}

/// The key columns returned by a bulk delete.
#[derive(Debug, Clone, FromRow)]
pub struct DeletedWorkRecord {
    pub id: DbId,
    pub group_key: String,
    pub month: i32,
    pub year: i32,
}

impl DeletedWorkRecord {
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey {
            group_key: self.group_key.clone(),
            month: self.month,
            year: self.year,
        }
    }
}
