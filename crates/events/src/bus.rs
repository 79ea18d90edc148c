//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`SignoffEvent`]s. It is
//! shared via `Arc<EventBus>` and events are published only after the
//! transaction that caused them has committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signoff_core::period::PeriodKey;
use signoff_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

pub const EVENT_OPENED: &str = "submission.opened";
pub const EVENT_PARTY_SIGNED: &str = "submission.party_signed";
pub const EVENT_READY_FOR_RECIPIENT: &str = "submission.ready_for_recipient";
pub const EVENT_RELEASED: &str = "submission.released";
pub const EVENT_COMPLETED: &str = "submission.completed";
pub const EVENT_RESET: &str = "submission.reset";
pub const EVENT_REMOVED: &str = "submission.removed";
pub const EVENT_RECIPIENT_NOTIFIED: &str = "submission.recipient_notified";
pub const EVENT_RECIPIENT_NOTIFY_FAILED: &str = "submission.recipient_notify_failed";

// ---------------------------------------------------------------------------
// SignoffEvent
// ---------------------------------------------------------------------------

/// Something durable happened to a submission period.
///
/// Constructed via [`SignoffEvent::new`] and enriched with the builder
/// methods [`for_period`](SignoffEvent::for_period),
/// [`with_actor`](SignoffEvent::with_actor), and
/// [`with_payload`](SignoffEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignoffEvent {
    /// Dot-separated event name, e.g. `"submission.completed"`.
    pub event_type: String,

    /// Period row id, when the row still exists.
    pub period_id: Option<DbId>,

    /// Natural key of the period.
    pub period_key: Option<PeriodKey>,

    /// Who caused the event: a party id, `"recipient"`, or `"admin:<id>"`.
    pub actor: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl SignoffEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            period_id: None,
            period_key: None,
            actor: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the period the event concerns.
    pub fn for_period(mut self, period_id: DbId, key: PeriodKey) -> Self {
        self.period_id = Some(period_id);
        self.period_key = Some(key);
        self
    }

    /// Attach the acting party or user.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<SignoffEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: SignoffEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<SignoffEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
