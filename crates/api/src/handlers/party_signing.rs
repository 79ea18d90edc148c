//! Handlers for `/sign/party/{token}`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::handlers::SignRequest;
use crate::middleware::client_ip::ClientIp;
use crate::response::{status_for_notification, DataResponse};
use crate::state::AppState;
use crate::workflow::ledger;

/// GET /api/v1/sign/party/{token}
///
/// Signing context for one party: period summary, the party's records and
/// overall progress.
pub async fn get_context(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let context = ledger::party_context(&state, &token).await?;
    Ok(Json(DataResponse { data: context }))
}

/// POST /api/v1/sign/party/{token}
///
/// Record the party's signature. Returns 207 when this signature completed
/// the period but the recipient could not be notified.
pub async fn sign(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ClientIp(origin_ip): ClientIp,
    Json(input): Json<SignRequest>,
) -> AppResult<impl IntoResponse> {
    let result =
        ledger::sign_as_party(&state, &token, &input.signature_blob, origin_ip.as_deref()).await?;
    let status = status_for_notification(result.notification);
    Ok((status, Json(DataResponse { data: result })))
}
