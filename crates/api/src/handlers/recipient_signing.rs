//! Handlers for `/sign/recipient/{token}`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::handlers::SignRequest;
use crate::middleware::client_ip::ClientIp;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::recipient;

/// GET /api/v1/sign/recipient/{token}
pub async fn get_context(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let context = recipient::recipient_context(&state, &token).await?;
    Ok(Json(DataResponse { data: context }))
}

/// POST /api/v1/sign/recipient/{token}
///
/// Countersign and complete the period. `document_ref` is null if rendering
/// failed; the completion stands either way.
pub async fn sign(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ClientIp(origin_ip): ClientIp,
    Json(input): Json<SignRequest>,
) -> AppResult<impl IntoResponse> {
    let result =
        recipient::sign_as_recipient(&state, &token, &input.signature_blob, origin_ip.as_deref())
            .await?;
    Ok(Json(DataResponse { data: result }))
}
