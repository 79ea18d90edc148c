//! Durable audit persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`SignoffEvent`] to the
//! `submission_events` table. It runs as a long-lived background task and
//! shuts down when the bus sender is dropped.

use signoff_core::types::DbId;
use signoff_db::models::submission_event::CreateSubmissionEvent;
use signoff_db::repositories::EventRepo;
use signoff_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::SignoffEvent;

/// Background service that persists sign-off events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel is closed.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<SignoffEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `submission_events` table.
    pub async fn persist(pool: &DbPool, event: &SignoffEvent) -> Result<DbId, sqlx::Error> {
        let key = event.period_key.as_ref();
        EventRepo::insert(
            pool,
            &CreateSubmissionEvent {
                event_type: &event.event_type,
                period_id: event.period_id,
                group_key: key.map(|k| k.group_key.as_str()),
                month: key.map(|k| k.month),
                year: key.map(|k| k.year),
                actor: event.actor.as_deref(),
                payload: &event.payload,
            },
        )
        .await
    }
}
