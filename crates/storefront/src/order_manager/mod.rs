//! # Order Lifecycle Manager
//!
//! Turns cart snapshots into durable orders and drives their status afterwards.
//!
//! ## Status machine
//!
//! ```text
//! pending ──► processing ──► shipped ──► delivered
//!    │            │             │
//!    └────────────┴─────────────┴──────► cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal. Under [`TransitionPolicy::Permissive`] (the default)
//! any status may be written over any other, as the back office has always allowed; under
//! [`TransitionPolicy::Strict`] a write that leaves the machine fails with
//! [`OrderError::InvalidTransition`].
//!
//! ## Consistency
//!
//! There are no cross-order transactions. Concurrent status writes to one order are serialized
//! by the `orders` collection actor and the last one wins; each write replaces `status` and
//! `updatedAt` together, so readers never see a mix of two writes.
//!
//! Every mutating call raises a success or error [`Notice`](crate::notice::Notice).

pub mod error;
pub mod feed;

pub use error::*;
pub use feed::OrderFeed;

use crate::clients::OrderClient;
use crate::model::{AuthState, CartSnapshot, Identity, Order, OrderId, OrderStatus};
use crate::notice::Notifier;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Whether status writes must follow the status machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

/// Per-session order operations. Cheap to clone.
#[derive(Clone)]
pub struct OrderManager {
    orders: OrderClient,
    auth: watch::Receiver<AuthState>,
    notifier: Notifier,
    policy: TransitionPolicy,
}

impl OrderManager {
    /// `auth` supplies the caller for status writes and deletes.
    pub fn new(
        orders: OrderClient,
        auth: watch::Receiver<AuthState>,
        notifier: Notifier,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            orders,
            auth,
            notifier,
            policy,
        }
    }

    fn caller(&self) -> Option<Identity> {
        self.auth.borrow().identity().cloned()
    }

    /// Places an order for `customer` holding a copy of the snapshot's lines.
    ///
    /// The total is computed once, here, and never recomputed. The cart itself is left alone.
    #[instrument(skip(self, cart, customer), fields(key = %cart.key, lines = cart.items.len()))]
    pub async fn create_order(
        &self,
        cart: &CartSnapshot,
        customer: Option<&Identity>,
    ) -> Result<OrderId, OrderError> {
        let result = self.place(cart, customer).await;
        match &result {
            Ok(id) => {
                info!(order_id = %id, "Order created");
                self.notifier.success("Order placed successfully!");
            }
            Err(e) => {
                warn!(error = %e, "Order creation failed");
                self.notifier.error("Failed to create order. Please try again.");
            }
        }
        result
    }

    async fn place(
        &self,
        cart: &CartSnapshot,
        customer: Option<&Identity>,
    ) -> Result<OrderId, OrderError> {
        let customer = customer
            .filter(|identity| identity.is_authenticated())
            .ok_or(OrderError::NotAuthenticated)?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let order = Order::pending(customer, cart.items.clone(), Utc::now());
        self.orders.create_order(Some(customer), &order).await
    }

    /// Live list of every order, newest first.
    pub fn subscribe_orders(&self) -> OrderFeed {
        OrderFeed::new(self.orders.subscribe_documents())
    }

    /// Writes `status` and stamps `updatedAt` with the current time.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), OrderError> {
        let result = self.write_status(id, status).await;
        match &result {
            Ok(()) => {
                info!(order_id = %id, %status, "Order status updated");
                self.notifier.success("Order status updated successfully");
            }
            Err(e) => {
                warn!(order_id = %id, error = %e, "Order status update failed");
                self.notifier
                    .error("Failed to update order status. Please try again.");
            }
        }
        result
    }

    async fn write_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), OrderError> {
        let caller = self.caller();
        if self.policy == TransitionPolicy::Strict {
            let current = self
                .orders
                .find_order(id)
                .await?
                .ok_or_else(|| OrderError::OrderNotFound(id.clone()))?;
            if !current.status.can_transition_to(status) {
                return Err(OrderError::InvalidTransition {
                    id: id.clone(),
                    from: current.status,
                    to: status,
                });
            }
        }
        self.orders
            .set_status(caller.as_ref(), id, status, Utc::now())
            .await
    }

    /// Removes the order for good.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<(), OrderError> {
        let caller = self.caller();
        let result = self.orders.delete_order(caller.as_ref(), id).await;
        match &result {
            Ok(()) => {
                info!(order_id = %id, "Order deleted");
                self.notifier.success("Order deleted successfully");
            }
            Err(e) => {
                warn!(order_id = %id, error = %e, "Order deletion failed");
                self.notifier.error("Failed to delete order. Please try again.");
            }
        }
        result
    }
}
