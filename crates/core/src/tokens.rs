//! Capability tokens for anonymous signers.
//!
//! A capability token lets an unauthenticated party act on exactly one
//! subject (a party's signing link, or a period's recipient slot) until it
//! expires. Tokens are random alphanumeric strings; only their SHA-256 digest
//! is stored, so the plaintext exists only in the issued signing URL.

use chrono::Duration;
use rand::Rng;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of a generated token. 48 alphanumeric characters carry ~285 bits.
pub const TOKEN_LENGTH: usize = 48;

/// Default lifetime of a party signing link, in days.
pub const DEFAULT_PARTY_TOKEN_TTL_DAYS: i64 = 30;

/// Default lifetime of a recipient signing link, in days.
pub const DEFAULT_RECIPIENT_TOKEN_TTL_DAYS: i64 = 14;

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// What a capability token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSubject {
    /// A single party's signing link within one period.
    PartyLink,
    /// The recipient slot of one period.
    Recipient,
}

impl TokenSubject {
    /// Entity name used in `NotFound` errors.
    pub fn entity(self) -> &'static str {
        match self {
            TokenSubject::PartyLink => "PartySigningLink",
            TokenSubject::Recipient => "RecipientSigningLink",
        }
    }

    /// Path segment under `/sign/` for links of this kind.
    pub fn path_segment(self) -> &'static str {
        match self {
            TokenSubject::PartyLink => "party",
            TokenSubject::Recipient => "recipient",
        }
    }
}

// ---------------------------------------------------------------------------
// Issuing
// ---------------------------------------------------------------------------

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Plaintext token, handed out once and never stored.
    pub plaintext: String,
    /// SHA-256 hex digest of the plaintext, stored for lookup.
    pub hash: String,
    /// Wall-clock expiry.
    pub expires_at: Timestamp,
}

/// Mint a new token valid for `ttl` from `now`.
pub fn issue(ttl: Duration, now: Timestamp) -> IssuedToken {
    let plaintext: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hash = hash_token(&plaintext);

    IssuedToken {
        plaintext,
        hash,
        expires_at: now + ttl,
    }
}

/// Compute the storage digest of a plaintext token.
pub fn hash_token(token: &str) -> String {
    crate::hashing::sha256_hex(token.as_bytes())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Reject tokens whose plaintext cannot have been issued by [`issue`].
///
/// Runs before any lookup, so malformed input never reaches storage and is
/// reported as `NotFound`, same as an unknown token.
pub fn check_shape(token: &str, subject: TokenSubject) -> Result<(), CoreError> {
    if token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(CoreError::not_found(subject.entity(), "token"))
    }
}

/// Fail closed when `expires_at` is at or before `now`.
pub fn ensure_fresh(
    expires_at: Timestamp,
    now: Timestamp,
    subject: TokenSubject,
) -> Result<(), CoreError> {
    if expires_at <= now {
        return Err(CoreError::Expired(format!(
            "{} expired at {expires_at}",
            subject.entity()
        )));
    }
    Ok(())
}

/// Build the public URL at which a token can be redeemed.
pub fn signing_url(base_url: &str, subject: TokenSubject, token: &str) -> String {
    format!(
        "{}/sign/{}/{token}",
        base_url.trim_end_matches('/'),
        subject.path_segment()
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
