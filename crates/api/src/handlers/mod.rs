//! HTTP handlers.
//!
//! Handlers only extract, delegate to [`crate::workflow`] and wrap the result
//! in a [`DataResponse`](crate::response::DataResponse).

pub mod admin;
pub mod party_signing;
pub mod recipient_signing;

use serde::Deserialize;

/// Body of both signing endpoints.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    /// `data:image/png;base64,...` image of the handwritten signature.
    pub signature_blob: String,
}
