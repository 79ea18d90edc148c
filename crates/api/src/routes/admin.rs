//! Route definitions for the `/admin` surface.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /submissions                                          -> create_submission
/// POST   /submissions/reset                                    -> reset_submission
/// GET    /submissions/{group_key}/{year}/{month}               -> get_status
/// POST   /submissions/{group_key}/{year}/{month}/party-links   -> issue_party_links
/// POST   /submissions/{group_key}/{year}/{month}/release       -> release
/// POST   /submissions/{group_key}/{year}/{month}/resend-recipient -> resend_recipient
/// PUT    /groups/{group_key}/recipient                         -> set_group_recipient
/// POST   /work-records/bulk-delete                             -> bulk_delete_work_records
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(admin::create_submission))
        .route("/submissions/reset", post(admin::reset_submission))
        .route(
            "/submissions/{group_key}/{year}/{month}",
            get(admin::get_status),
        )
        .route(
            "/submissions/{group_key}/{year}/{month}/party-links",
            post(admin::issue_party_links),
        )
        .route(
            "/submissions/{group_key}/{year}/{month}/release",
            post(admin::release),
        )
        .route(
            "/submissions/{group_key}/{year}/{month}/resend-recipient",
            post(admin::resend_recipient),
        )
        .route(
            "/groups/{group_key}/recipient",
            put(admin::set_group_recipient),
        )
        .route(
            "/work-records/bulk-delete",
            post(admin::bulk_delete_work_records),
        )
}
