//! Error taxonomy for the engine.
//!
//! Every operation returns one of these kinds. The HTTP layer maps them to
//! status codes; the engine itself never deals in transport codes. All
//! checks run in a fixed order (session, password gate, visibility,
//! permission, invariant) and short-circuit on the first failure, so a
//! rejected operation never leaves a partial mutation behind.

use crate::auth::password::PasswordError;

/// Engine result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Unified engine error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No session, an invalid or expired token, or bad login credentials
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the mandatory initial password change is pending
    #[error("password change required")]
    PasswordChangeRequired,

    /// The actor lacks permission, or the target is outside their visibility
    #[error("{0}")]
    Forbidden(String),

    /// The entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (duplicate username or email)
    #[error("{0}")]
    Conflict(String),

    /// The request violates an invariant (System role mutation, admin
    /// deletion, non-member leader, malformed patch)
    #[error("{0}")]
    Invalid(String),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: &str, id: i64) -> Self {
        Error::NotFound(format!("{} {} not found", kind, id))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Error::Forbidden(msg.into())
    }
}

impl From<PasswordError> for Error {
    fn from(err: PasswordError) -> Self {
        Error::Internal(format!("password operation failed: {}", err))
    }
}
