//! Required-versus-signed projection over a period's work records.
//!
//! The required-signer set is never stored. It is recomputed from the current
//! work records every time it is needed, and only signatures from parties that
//! are still required count toward completion.

use std::collections::BTreeSet;

use serde::Serialize;

/// Signing progress of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SigningProgress {
    pub signed: usize,
    pub total: usize,
}

impl SigningProgress {
    /// Project progress from the required set and the parties that signed.
    ///
    /// Signatures from parties outside `required` are ignored.
    pub fn project(required: &BTreeSet<String>, signed: &BTreeSet<String>) -> Self {
        Self {
            signed: required.intersection(signed).count(),
            total: required.len(),
        }
    }

    /// Every required party has signed, and at least one party is required.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.signed == self.total
    }
}
