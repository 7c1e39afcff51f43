//! # Framework Errors
//!
//! Errors raised by the collection actor machinery itself. Entity specific failures travel
//! inside [`FrameworkError::EntityError`] and are mapped back into domain errors by the
//! client wrappers.

/// Errors that can occur within the collection actor framework.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// True when the actor behind the client is gone, as opposed to a request that failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FrameworkError::ActorClosed | FrameworkError::ActorDropped)
    }
}
