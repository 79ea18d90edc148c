//! Route definitions for the token-authenticated `/sign` surface.

use axum::routing::get;
use axum::Router;

use crate::handlers::{party_signing, recipient_signing};
use crate::state::AppState;

/// Routes mounted at `/sign`.
///
/// ```text
/// GET    /party/{token}        -> party_signing::get_context
/// POST   /party/{token}        -> party_signing::sign
/// GET    /recipient/{token}    -> recipient_signing::get_context
/// POST   /recipient/{token}    -> recipient_signing::sign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/party/{token}",
            get(party_signing::get_context).post(party_signing::sign),
        )
        .route(
            "/recipient/{token}",
            get(recipient_signing::get_context).post(recipient_signing::sign),
        )
}
