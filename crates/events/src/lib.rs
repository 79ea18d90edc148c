//! Sign-off event bus, audit persistence and recipient notification.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SignoffEvent`] -- the audit event envelope published after every
//!   committed transition.
//! - [`EventPersistence`] -- background service that durably writes every
//!   event to the `submission_events` table.
//! - [`delivery`] -- the [`RecipientNotifier`] collaborator and its SMTP and
//!   log-only implementations.

pub mod bus;
pub mod delivery;
pub mod persistence;

pub use bus::{EventBus, SignoffEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::{LogOnlyNotifier, NotifyError, RecipientNotice, RecipientNotifier};
pub use persistence::EventPersistence;
