//! Error types for order operations.

use crate::clients::rules::RuleViolation;
use crate::model::order::OrderStatus;
use crate::model::OrderId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// No resolved identity with a role was supplied.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The orders collection rejected the caller's role.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The cart snapshot had no lines; nothing was written.
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The remote store could not be reached.
    #[error("Order store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Only raised when strict transitions are enabled.
    #[error("Order {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Malformed order document: {0}")]
    MalformedDocument(String),
}

impl From<RuleViolation> for OrderError {
    fn from(violation: RuleViolation) -> Self {
        OrderError::Unauthorized(violation.to_string())
    }
}
