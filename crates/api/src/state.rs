use std::sync::Arc;

use signoff_events::{EventBus, RecipientNotifier};

use crate::config::ServerConfig;
use crate::workflow::render::DocumentRenderer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: signoff_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Audit event bus; events are published after their transaction commits.
    pub event_bus: Arc<EventBus>,
    /// Delivers recipient signing links.
    pub notifier: Arc<dyn RecipientNotifier>,
    /// Produces the document reference for completed periods.
    pub renderer: Arc<dyn DocumentRenderer>,
}
