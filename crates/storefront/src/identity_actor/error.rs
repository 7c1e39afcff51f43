//! Error types for identity resolution and user records.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IdentityError {
    /// No user record matches the given e-mail address.
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Malformed user record {uid}: {reason}")]
    MalformedRecord { uid: String, reason: String },

    /// The users collection could not be reached.
    #[error("User store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The resolver task has shut down.
    #[error("Identity resolver closed")]
    ResolverClosed,
}
