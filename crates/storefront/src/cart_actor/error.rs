//! Error types for the cart and its persisted slots.

use thiserror::Error;

/// Errors surfaced by [`CartStore`](super::CartStore) calls.
///
/// Persistence failures never show up here: the cart logs them and carries on in memory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Cart actor closed")]
    Closed,
}

/// Errors from a slot backend.
#[derive(Debug, Error)]
pub enum SlotError {
    /// The backing storage could not be read or written.
    #[error("Persistence unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// The slot exists but does not hold a cart.
    #[error("Slot {key} holds malformed cart data: {source}")]
    Malformed {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to encode cart: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Slot writer closed")]
    WriterClosed,
}
