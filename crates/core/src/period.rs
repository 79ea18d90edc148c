//! The natural key of a submission period: one period per group per month.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a group key.
pub const MAX_GROUP_KEY_LENGTH: usize = 128;

/// Earliest year accepted for a period.
pub const MIN_YEAR: i32 = 2000;

/// Latest year accepted for a period.
pub const MAX_YEAR: i32 = 2100;

/// `(group_key, month, year)` identifying one submission period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    pub group_key: String,
    pub month: i32,
    pub year: i32,
}

impl PeriodKey {
    /// Build a key, rejecting blank groups and out-of-range months or years.
    pub fn new(group_key: impl Into<String>, month: i32, year: i32) -> Result<Self, CoreError> {
        let key = Self {
            group_key: group_key.into(),
            month,
            year,
        };
        key.validate().map_err(CoreError::Validation)?;
        Ok(key)
    }

    pub fn validate(&self) -> Result<(), String> {
        let group = self.group_key.trim();
        if group.is_empty() {
            return Err("group_key must not be empty".to_string());
        }
        if group.len() > MAX_GROUP_KEY_LENGTH {
            return Err(format!(
                "group_key must be at most {MAX_GROUP_KEY_LENGTH} characters"
            ));
        }
        if !(1..=12).contains(&self.month) {
            return Err(format!("month must be between 1 and 12, got {}", self.month));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(format!(
                "year must be between {MIN_YEAR} and {MAX_YEAR}, got {}",
                self.year
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:04}-{:02}", self.group_key, self.year, self.month)
    }
}
