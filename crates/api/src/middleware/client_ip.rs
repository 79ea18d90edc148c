//! Originating client address for signature provenance.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

/// Maximum stored length of a client address.
const MAX_IP_LENGTH: usize = 64;

/// Client address taken from the first `X-Forwarded-For` entry, falling back
/// to `X-Real-IP`. `None` when neither header is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip_from_headers(&parts.headers)))
    }
}

pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());

    let real_ip = || headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    forwarded
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| real_ip().map(str::trim).filter(|s| !s.is_empty()))
        .map(|s| s.chars().take(MAX_IP_LENGTH).collect())
}
