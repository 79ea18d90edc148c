//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })`.

use axum::http::StatusCode;
use serde::Serialize;

use crate::workflow::gate::NotificationStatus;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Status code for a write whose durable part succeeded.
///
/// A failed downstream notification turns the response into 207 Multi-Status
/// so the caller knows not to retry the write itself.
pub fn status_for_notification(notification: NotificationStatus) -> StatusCode {
    match notification {
        NotificationStatus::Failed => StatusCode::MULTI_STATUS,
        NotificationStatus::Sent | NotificationStatus::NotRequired => StatusCode::OK,
    }
}
