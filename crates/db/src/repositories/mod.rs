//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Single-statement methods accept any [`sqlx::PgExecutor`]; methods that
//! issue several statements take `&mut PgConnection`.

pub mod event_repo;
pub mod group_recipient_repo;
pub mod party_signature_repo;
pub mod party_signing_link_repo;
pub mod submission_period_repo;
pub mod work_record_repo;

pub use event_repo::EventRepo;
pub use group_recipient_repo::GroupRecipientRepo;
pub use party_signature_repo::PartySignatureRepo;
pub use party_signing_link_repo::PartySigningLinkRepo;
pub use submission_period_repo::SubmissionPeriodRepo;
pub use work_record_repo::WorkRecordRepo;
