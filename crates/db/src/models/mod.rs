//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts where the table is written by the service

pub mod group_recipient;
pub mod party_signature;
pub mod party_signing_link;
pub mod submission_event;
pub mod submission_period;
pub mod work_record;
