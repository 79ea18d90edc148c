//! Domain core for multi-party monthly sign-off.
//!
//! This crate has no IO. It owns the error taxonomy, the submission status
//! machine, capability-token minting, signature payload validation and the
//! required-signer projection math. The `db` and `api` crates build on it.

pub mod contact;
pub mod error;
pub mod hashing;
pub mod period;
pub mod progress;
pub mod roles;
pub mod signature;
pub mod submission;
pub mod tokens;
pub mod types;
pub mod work_record;
