//! Handlers for the `/admin` sign-off resources.
//!
//! Every handler requires the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use signoff_core::period::PeriodKey;
use signoff_core::types::DbId;
use signoff_db::models::group_recipient::UpsertGroupRecipient;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{status_for_notification, DataResponse};
use crate::state::AppState;
use crate::workflow::admin::{self, RecipientOverride};
use crate::workflow::{cleanup, reset};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body for opening a period.
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub group_key: String,
    pub month: i32,
    pub year: i32,
    /// Per-period recipient; the group default applies when absent.
    pub recipient: Option<RecipientOverride>,
}

/// Body for issuing party links. Omitting `parties` issues for every
/// required party.
#[derive(Debug, Default, Deserialize)]
pub struct IssueLinksRequest {
    #[serde(default)]
    pub parties: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub group_key: String,
    pub month: i32,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub record_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/submissions
///
/// Open a period. 201 when created, 200 when it already existed.
pub async fn create_submission(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateSubmissionRequest>,
) -> AppResult<impl IntoResponse> {
    let key = PeriodKey::new(input.group_key, input.month, input.year)?;
    let opened = admin::open_period(&state, &key, input.recipient.as_ref(), &admin.actor()).await?;
    let status = if opened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: opened })))
}

/// GET /api/v1/admin/submissions/{group_key}/{year}/{month}
pub async fn get_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((group_key, year, month)): Path<(String, i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let key = PeriodKey::new(group_key, month, year)?;
    let view = admin::status_view(&state, &key).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/admin/submissions/{group_key}/{year}/{month}/party-links
///
/// Issue private signing links. The URLs are returned once and never stored.
pub async fn issue_party_links(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((group_key, year, month)): Path<(String, i32, i32)>,
    Json(input): Json<IssueLinksRequest>,
) -> AppResult<impl IntoResponse> {
    let key = PeriodKey::new(group_key, month, year)?;
    let links =
        admin::issue_party_links(&state, &key, input.parties.as_deref(), &admin.actor()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: links })))
}

/// POST /api/v1/admin/submissions/{group_key}/{year}/{month}/release
///
/// Manual override: hand the period to the recipient before every party
/// signed.
pub async fn release(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((group_key, year, month)): Path<(String, i32, i32)>,
    Json(input): Json<ReleaseRequest>,
) -> AppResult<impl IntoResponse> {
    let key = PeriodKey::new(group_key, month, year)?;
    let result = admin::release(&state, &key, &input.note, &admin.actor()).await?;
    let status = status_for_notification(result.notification);
    Ok((status, Json(DataResponse { data: result })))
}

/// POST /api/v1/admin/submissions/{group_key}/{year}/{month}/resend-recipient
pub async fn resend_recipient(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((group_key, year, month)): Path<(String, i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let key = PeriodKey::new(group_key, month, year)?;
    let result = admin::resend_recipient(&state, &key, &admin.actor()).await?;
    let status = status_for_notification(result.notification);
    Ok((status, Json(DataResponse { data: result })))
}

/// POST /api/v1/admin/submissions/reset
///
/// Strip every signature from a period and rewind it to `pending_employees`.
pub async fn reset_submission(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ResetRequest>,
) -> AppResult<impl IntoResponse> {
    let key = PeriodKey::new(input.group_key, input.month, input.year)?;
    let summary = reset::reset(&state, &key, &admin.actor()).await?;
    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// Groups and work records
// ---------------------------------------------------------------------------

/// PUT /api/v1/admin/groups/{group_key}/recipient
pub async fn set_group_recipient(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(group_key): Path<String>,
    Json(input): Json<UpsertGroupRecipient>,
) -> AppResult<impl IntoResponse> {
    let recipient = admin::set_group_recipient(&state, &group_key, &input, &admin.actor()).await?;
    Ok(Json(DataResponse { data: recipient }))
}

/// POST /api/v1/admin/work-records/bulk-delete
///
/// Delete work records, remove any period left without records and hand off
/// any period whose remaining parties have all signed. All ids must exist or
/// nothing is deleted.
pub async fn bulk_delete_work_records(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BulkDeleteRequest>,
) -> AppResult<impl IntoResponse> {
    let summary = cleanup::bulk_delete(&state, &input.record_ids, &admin.actor()).await?;
    Ok(Json(DataResponse { data: summary }))
}
