pub mod admin;
pub mod health;
pub mod signing;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sign/party/{token}                                         context, sign (party token)
/// /sign/recipient/{token}                                     context, sign (recipient token)
///
/// /admin/submissions                                          open period (POST)
/// /admin/submissions/reset                                    reset period (POST)
/// /admin/submissions/{group_key}/{year}/{month}               status view (GET)
/// /admin/submissions/{group_key}/{year}/{month}/party-links   issue party links (POST)
/// /admin/submissions/{group_key}/{year}/{month}/release       manual release (POST)
/// /admin/submissions/{group_key}/{year}/{month}/resend-recipient  resend link (POST)
/// /admin/groups/{group_key}/recipient                         set default recipient (PUT)
/// /admin/work-records/bulk-delete                             bulk delete (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sign", signing::router())
        .nest("/admin", admin::router())
}
