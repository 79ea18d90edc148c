//! Outbound delivery of recipient signing links.
//!
//! [`RecipientNotifier`] is the seam between the signing workflow and the
//! outside world. The workflow calls it after the hand-off transaction has
//! committed and records the outcome; a failure never rolls back the
//! transition.

pub mod email;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use signoff_core::period::PeriodKey;

use crate::delivery::email::EmailError;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// Everything a notifier needs to tell the recipient their signature is due.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientNotice {
    pub email: String,
    pub display_name: String,
    pub period: PeriodKey,
    /// Public URL embedding the plaintext recipient token.
    pub signing_url: String,
    pub expires_at: DateTime<Utc>,
}

impl RecipientNotice {
    /// Subject line used by text-based channels.
    pub fn subject(&self) -> String {
        format!(
            "Signature required: {} {:04}-{:02}",
            self.period.group_key, self.period.year, self.period.month
        )
    }

    /// Plain-text body used by text-based channels.
    pub fn body(&self) -> String {
        format!(
            "Hello {name},\n\n\
             All work records of {group} for {year:04}-{month:02} have been signed.\n\
             Please review and countersign here:\n\n{url}\n\n\
             This link expires at {expires}.",
            name = self.display_name,
            group = self.period.group_key,
            year = self.period.year,
            month = self.period.month,
            url = self.signing_url,
            expires = self.expires_at.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Error returned by a [`RecipientNotifier`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Email(#[from] EmailError),

    /// The channel refused or could not accept the notice.
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Delivers recipient signing links.
#[async_trait]
pub trait RecipientNotifier: Send + Sync {
    async fn notify_recipient(&self, notice: &RecipientNotice) -> Result<(), NotifyError>;
}

/// Notifier used when no delivery channel is configured.
///
/// Logs the notice, including the signing URL, so a local operator can
/// forward it by hand.
#[derive(Debug, Default, Clone)]
pub struct LogOnlyNotifier;

#[async_trait]
impl RecipientNotifier for LogOnlyNotifier {
    async fn notify_recipient(&self, notice: &RecipientNotice) -> Result<(), NotifyError> {
        tracing::warn!(
            to = %notice.email,
            period = %notice.period,
            signing_url = %notice.signing_url,
            "SMTP not configured, recipient link logged instead of sent"
        );
        Ok(())
    }
}
