use super::{RemoteStore, ShutdownError};
use crate::cart_actor::{self, CartError, CartStore, SlotStore, SlotWorker};
use crate::config::StorefrontConfig;
use crate::gate::{AccessGate, RouteTable};
use crate::identity_actor::{self, IdentityError, IdentityHandle};
use crate::model::{AuthSession, AuthState, OrderId, PartitionKey};
use crate::notice::Notifier;
use crate::order_manager::{OrderError, OrderManager};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// One browsing session: identity resolver, cart, order manager, gate and notices, wired to the
/// shared [`RemoteStore`].
pub struct Session {
    pub identity: IdentityHandle,
    pub cart: CartStore,
    pub orders: OrderManager,
    pub gate: AccessGate,
    pub notifier: Notifier,
    handles: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn start(remote: &RemoteStore, slots: Arc<dyn SlotStore>, config: &StorefrontConfig) -> Self {
        let capacity = config.mailbox_capacity;
        let notifier = Notifier::new(config.notice_capacity);

        // 1. Create actors
        let (resolver, identity) = identity_actor::new(capacity, remote.users.clone());
        let (slot_worker, slot_writer) = SlotWorker::new(capacity, slots);
        let (cart_actor, cart) = cart_actor::new(capacity, slot_writer, notifier.clone());

        // 2. Start them, then let the cart follow the identity
        let resolver_handle = tokio::spawn(resolver.run());
        let slot_handle = tokio::spawn(slot_worker.run());
        let cart_handle = tokio::spawn(cart_actor.run());
        let follow_handle = cart.follow_identity(identity.watch());

        let orders = OrderManager::new(
            remote.orders.clone(),
            identity.watch(),
            notifier.clone(),
            config.transition_policy,
        );
        let gate = AccessGate::new(
            identity.watch(),
            RouteTable::storefront_default(),
            notifier.clone(),
        );
        info!("Session started");

        Self {
            identity,
            cart,
            orders,
            gate,
            notifier,
            handles: vec![resolver_handle, follow_handle, cart_handle, slot_handle],
        }
    }

    /// Resolves a sign-in and waits until the cart has switched to that user's partition.
    #[instrument(skip(self, session), fields(uid = %session.uid))]
    pub async fn sign_in(&self, session: AuthSession) -> Result<AuthState, SessionError> {
        let state = self.identity.sign_in(session).await?;
        self.settle(&state).await?;
        Ok(state)
    }

    /// Like [`sign_in`](Self::sign_in), creating the `customer` user record first.
    #[instrument(skip(self, session), fields(uid = %session.uid))]
    pub async fn sign_up(&self, session: AuthSession) -> Result<AuthState, SessionError> {
        let state = self.identity.sign_up(session).await?;
        self.settle(&state).await?;
        Ok(state)
    }

    /// Signs out and waits until the guest cart is active again.
    pub async fn sign_out(&self) -> Result<AuthState, SessionError> {
        let state = self.identity.sign_out().await?;
        self.settle(&state).await?;
        Ok(state)
    }

    async fn settle(&self, state: &AuthState) -> Result<(), SessionError> {
        if let Some(key) = PartitionKey::for_auth(state) {
            self.cart.wait_for_partition(&key).await?;
        }
        Ok(())
    }

    /// Places an order for the signed-in customer's cart, then empties that cart.
    ///
    /// Waits until the active partition belongs to the customer, so an identity switch the cart
    /// has not caught up with yet can never order another partition's lines. The cart is only
    /// cleared after the order has been stored, and only if that partition is still active.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<OrderId, SessionError> {
        let state = self.identity.current();
        let Some(customer) = state.identity().filter(|identity| identity.is_authenticated())
        else {
            self.notifier.error("Please log in to proceed with checkout");
            return Err(OrderError::NotAuthenticated.into());
        };
        let key = PartitionKey::for_user(&customer.id);
        let snapshot = self.cart.wait_for_partition(&key).await?;
        if snapshot.is_empty() {
            self.notifier.error("Your cart is empty");
            return Err(OrderError::EmptyCart.into());
        }

        let id = self.orders.create_order(&snapshot, Some(customer)).await?;
        match self.cart.clear_partition(&key).await {
            Ok(true) => {}
            Ok(false) => warn!(order_id = %id, %key, "Order placed but partition no longer active"),
            Err(e) => warn!(order_id = %id, error = %e, "Order placed but cart not cleared"),
        }
        info!(order_id = %id, "Checkout complete");
        Ok(id)
    }

    /// Stops every task of this session and waits for the cart's pending writes to land.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        info!("Shutting down session...");
        if let Err(e) = self.cart.flush().await {
            warn!(error = %e, "Cart flush failed during shutdown");
        }
        // The resolver stops with its last handle; the cart's identity follower stops with the
        // resolver, the cart with the follower, the slot writer with the cart.
        drop(self.identity);
        drop(self.cart);
        drop(self.orders);
        drop(self.gate);
        super::join_all("session", self.handles).await?;
        info!("Session shutdown complete.");
        Ok(())
    }
}
