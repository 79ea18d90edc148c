/// Domain error taxonomy shared by every layer of the sign-off service.
///
/// Storage-level failures are translated into these variants before they
/// leave the workflow layer, so callers never see raw database errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A capability token is past its expiry.
    #[error("Expired: {0}")]
    Expired(String),

    /// The token's backing entity already reached its terminal state.
    #[error("Already consumed: {0}")]
    AlreadyConsumed(String),

    #[error("Already signed: {0}")]
    AlreadySigned(String),

    /// The action is not valid for the period's current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A serialization conflict; the caller should retry the whole operation.
    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Whether the operation that produced this error may be retried as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::TransientConflict(_))
    }
}
