//! Validation of signature payloads.
//!
//! Signatures are opaque images captured in the browser and submitted as
//! base64 data URLs. The service stores them verbatim; it only checks that
//! the payload has the expected shape and a sane size.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum accepted length of a signature data URL, in bytes.
pub const MAX_SIGNATURE_BYTES: usize = 512 * 1024;

/// Minimum length of the base64 body. Rejects empty canvases.
pub const MIN_SIGNATURE_BODY_CHARS: usize = 16;

static DATA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/(png|jpeg|svg\+xml);base64,(?P<body>[A-Za-z0-9+/]+={0,2})$")
        .expect("valid regex")
});

/// Validate a signature data URL.
pub fn validate_signature_blob(blob: &str) -> Result<(), String> {
    if blob.is_empty() {
        return Err("Signature is required".to_string());
    }
    if blob.len() > MAX_SIGNATURE_BYTES {
        return Err(format!(
            "Signature exceeds the maximum size of {MAX_SIGNATURE_BYTES} bytes"
        ));
    }
    let captures = DATA_URL_RE.captures(blob).ok_or_else(|| {
        "Signature must be a base64 PNG, JPEG or SVG data URL".to_string()
    })?;
    if captures["body"].len() < MIN_SIGNATURE_BODY_CHARS {
        return Err("Signature image is empty".to_string());
    }
    Ok(())
}
