//! # Cart Actor
//!
//! The client-side cart: one active partition of `(product, quantity)` lines, mirrored to a
//! durable slot.
//!
//! ## Overview
//!
//! - Mutations from any number of callers go through the actor's mailbox and apply in call order.
//! - Readers never talk to the actor: they read the latest [`CartSnapshot`] from a `watch`
//!   channel, so a reader sees either the whole old partition or the whole new one.
//! - Persistence is fire-and-forget through a FIFO [`SlotWriter`]. Load and save failures are
//!   logged and the cart carries on in memory; callers never see them.
//!
//! ## Partition switch
//!
//! [`CartStore::activate`] (driven by [`CartStore::follow_identity`]) stops using the old key,
//! loads the slot of the new key through the same FIFO writer (empty if absent or unreadable)
//! and replaces the state in one step. Guest lines are not merged into a user's cart.
//!
//! ## Structure
//!
//! - [`slot`] - [`SlotStore`] backends: [`FileSlotStore`], [`MemorySlotStore`]
//! - [`writer`] - the FIFO [`SlotWorker`] / [`SlotWriter`] pair
//! - [`error`] - [`CartError`], [`SlotError`]

pub mod error;
pub mod slot;
pub mod writer;

pub use error::*;
pub use slot::{FileSlotStore, MemorySlotStore, SlotStore};
pub use writer::{SlotWorker, SlotWriter};

use crate::model::cart::MAX_LINE_QUANTITY;
use crate::model::{AuthState, CartItem, CartSnapshot, PartitionKey, Product, ProductId};
use crate::notice::Notifier;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// What `add_item` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    QuantityIncreased { quantity: u32 },
}

#[derive(Debug)]
enum CartCommand {
    Add {
        product: Product,
        respond_to: oneshot::Sender<AddOutcome>,
    },
    Remove {
        product_id: ProductId,
        respond_to: oneshot::Sender<bool>,
    },
    SetQuantity {
        product_id: ProductId,
        quantity: i64,
        respond_to: oneshot::Sender<()>,
    },
    /// Clears the active partition, or only `key` when it is still the active one.
    Clear {
        key: Option<PartitionKey>,
        respond_to: oneshot::Sender<bool>,
    },
    Activate {
        key: PartitionKey,
        respond_to: oneshot::Sender<()>,
    },
    Flush {
        respond_to: oneshot::Sender<()>,
    },
}

pub struct CartActor {
    receiver: mpsc::Receiver<CartCommand>,
    key: PartitionKey,
    items: Vec<CartItem>,
    slots: SlotWriter,
    view: watch::Sender<CartSnapshot>,
    notifier: Notifier,
}

/// Creates the cart actor and its store handle. The cart starts on the guest partition.
pub fn new(buffer_size: usize, slots: SlotWriter, notifier: Notifier) -> (CartActor, CartStore) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (view, snapshots) = watch::channel(CartSnapshot::empty(PartitionKey::guest()));
    let actor = CartActor {
        receiver,
        key: PartitionKey::guest(),
        items: Vec::new(),
        slots,
        view,
        notifier,
    };
    (
        actor,
        CartStore {
            sender,
            view: snapshots,
        },
    )
}

impl CartActor {
    pub async fn run(mut self) {
        info!(key = %self.key, "Cart started");
        self.items = self.load(&self.key.clone()).await;
        self.publish();

        while let Some(command) = self.receiver.recv().await {
            match command {
                CartCommand::Add {
                    product,
                    respond_to,
                } => {
                    let outcome = self.add(product).await;
                    let _ = respond_to.send(outcome);
                }
                CartCommand::Remove {
                    product_id,
                    respond_to,
                } => {
                    let removed = self.remove(&product_id).await;
                    let _ = respond_to.send(removed);
                }
                CartCommand::SetQuantity {
                    product_id,
                    quantity,
                    respond_to,
                } => {
                    if quantity <= 0 {
                        self.remove(&product_id).await;
                    } else {
                        self.set_quantity(&product_id, quantity).await;
                    }
                    let _ = respond_to.send(());
                }
                CartCommand::Clear { key, respond_to } => {
                    let cleared = match key {
                        Some(key) if key != self.key => {
                            debug!(%key, active = %self.key, "Clear for inactive partition ignored");
                            false
                        }
                        _ => {
                            self.clear().await;
                            true
                        }
                    };
                    let _ = respond_to.send(cleared);
                }
                CartCommand::Activate { key, respond_to } => {
                    self.activate(key).await;
                    let _ = respond_to.send(());
                }
                CartCommand::Flush { respond_to } => {
                    self.slots.flush().await;
                    let _ = respond_to.send(());
                }
            }
        }
        info!(key = %self.key, items = self.items.len(), "Cart shutdown");
    }

    async fn add(&mut self, product: Product) -> AddOutcome {
        let name = product.name.clone();
        let outcome = match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1).min(MAX_LINE_QUANTITY);
                AddOutcome::QuantityIncreased {
                    quantity: item.quantity,
                }
            }
            None => {
                self.items.push(CartItem::from_product(product));
                AddOutcome::Added
            }
        };
        self.persist().await;
        match outcome {
            AddOutcome::Added => self.notifier.success(format!("{name} added to cart!")),
            AddOutcome::QuantityIncreased { .. } => self
                .notifier
                .success(format!("{name} quantity updated in cart!")),
        }
        debug!(key = %self.key, ?outcome, "Item added");
        outcome
    }

    async fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.persist().await;
            self.notifier.info("Item removed from cart.");
        }
        debug!(key = %self.key, %product_id, removed, "Item removed");
        removed
    }

    async fn clear(&mut self) {
        self.items.clear();
        self.publish();
        self.slots.remove(self.key.clone()).await;
        self.notifier.success("Cart cleared!");
        info!(key = %self.key, "Cart cleared");
    }

    async fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        let quantity = u32::try_from(quantity)
            .unwrap_or(u32::MAX)
            .min(MAX_LINE_QUANTITY);
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        else {
            debug!(key = %self.key, %product_id, "Quantity change for absent item ignored");
            return;
        };
        item.quantity = quantity;
        self.persist().await;
        self.notifier.success("Cart updated!");
    }

    async fn activate(&mut self, key: PartitionKey) {
        if key == self.key {
            return;
        }
        let items = self.load(&key).await;
        info!(from = %self.key, to = %key, items = items.len(), "Cart partition switched");
        self.key = key;
        self.items = items;
        self.publish();
    }

    /// Reads a slot through the FIFO writer. Anything unreadable degrades to an empty cart.
    async fn load(&self, key: &PartitionKey) -> Vec<CartItem> {
        match self.slots.load(key.clone()).await {
            Ok(Some(items)) => normalize(key, items),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(%key, error = %e, "Cart load failed, starting empty");
                Vec::new()
            }
        }
    }

    async fn persist(&self) {
        self.publish();
        self.slots.save(self.key.clone(), self.items.clone()).await;
    }

    fn publish(&self) {
        self.view.send_replace(CartSnapshot {
            key: self.key.clone(),
            items: self.items.clone(),
        });
    }
}

/// Drops lines no cart could hold: non-positive quantities, negative prices, repeated products.
fn normalize(key: &PartitionKey, items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = HashSet::new();
    let total = items.len();
    let kept: Vec<CartItem> = items
        .into_iter()
        .filter(|item| item.is_valid() && seen.insert(item.product_id.clone()))
        .collect();
    if kept.len() != total {
        warn!(%key, dropped = total - kept.len(), "Dropped invalid cart lines");
    }
    kept
}

/// Handle to the cart. Cheap to clone; mutations wait for the actor, reads do not.
#[derive(Clone)]
pub struct CartStore {
    sender: mpsc::Sender<CartCommand>,
    view: watch::Receiver<CartSnapshot>,
}

impl CartStore {
    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> CartCommand,
    ) -> Result<R, CartError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CartError::Closed)?;
        response.await.map_err(|_| CartError::Closed)
    }

    /// Adds one unit of `product`: a new line, or one more of an existing line.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&self, product: Product) -> Result<AddOutcome, CartError> {
        self.request(|respond_to| CartCommand::Add {
            product,
            respond_to,
        })
        .await
    }

    /// Removes the line for `product_id`. Returns whether a line was present.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<bool, CartError> {
        let product_id = product_id.clone();
        self.request(|respond_to| CartCommand::Remove {
            product_id,
            respond_to,
        })
        .await
    }

    /// Overwrites a line's quantity. `quantity <= 0` removes the line.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<(), CartError> {
        let product_id = product_id.clone();
        self.request(|respond_to| CartCommand::SetQuantity {
            product_id,
            quantity,
            respond_to,
        })
        .await
    }

    /// Empties the cart and removes its persisted slot.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        self.request(|respond_to| CartCommand::Clear {
            key: None,
            respond_to,
        })
        .await
        .map(|_| ())
    }

    /// Like [`clear`](Self::clear), but only while `key` is the active partition.
    /// Returns whether anything was cleared.
    #[instrument(skip(self))]
    pub async fn clear_partition(&self, key: &PartitionKey) -> Result<bool, CartError> {
        let key = Some(key.clone());
        self.request(|respond_to| CartCommand::Clear { key, respond_to })
            .await
    }

    /// Switches to the partition `key`, loading its slot.
    #[instrument(skip(self))]
    pub async fn activate(&self, key: PartitionKey) -> Result<(), CartError> {
        self.request(|respond_to| CartCommand::Activate { key, respond_to })
            .await
    }

    /// Resolves once every slot operation issued so far has reached the backend.
    pub async fn flush(&self) -> Result<(), CartError> {
        self.request(|respond_to| CartCommand::Flush { respond_to })
            .await
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.view.borrow().clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.view.borrow().items.clone()
    }

    pub fn key(&self) -> PartitionKey {
        self.view.borrow().key.clone()
    }

    /// Σ price × quantity, computed from the current lines on every call.
    pub fn total(&self) -> Decimal {
        self.view.borrow().total()
    }

    pub fn item_count(&self) -> u64 {
        self.view.borrow().item_count()
    }

    pub fn watch(&self) -> watch::Receiver<CartSnapshot> {
        self.view.clone()
    }

    /// Waits until the active partition is `key`.
    pub async fn wait_for_partition(&self, key: &PartitionKey) -> Result<CartSnapshot, CartError> {
        let mut view = self.view.clone();
        let snapshot = view
            .wait_for(|snapshot| &snapshot.key == key)
            .await
            .map_err(|_| CartError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Keeps the active partition in step with the session's identity.
    ///
    /// `Resolving` leaves the partition alone; sign-out selects the guest cart. The task ends
    /// when the identity channel closes or the cart shuts down.
    pub fn follow_identity(&self, mut auth: watch::Receiver<AuthState>) -> JoinHandle<()> {
        let cart = self.clone();
        tokio::spawn(async move {
            auth.mark_changed();
            while auth.changed().await.is_ok() {
                let key = PartitionKey::for_auth(&auth.borrow_and_update());
                if let Some(key) = key {
                    if cart.activate(key).await.is_err() {
                        break;
                    }
                }
            }
            debug!("Cart stopped following identity");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use crate::notice::NoticeLevel;
    use std::sync::Arc;

    struct Harness {
        cart: CartStore,
        slots: MemorySlotStore,
        notifier: Notifier,
    }

    fn start_with(slots: MemorySlotStore) -> Harness {
        let notifier = Notifier::new(32);
        let (worker, writer) = SlotWorker::new(16, Arc::new(slots.clone()));
        tokio::spawn(worker.run());
        let (actor, cart) = new(16, writer, notifier.clone());
        tokio::spawn(actor.run());
        Harness {
            cart,
            slots,
            notifier,
        }
    }

    fn start() -> Harness {
        start_with(MemorySlotStore::new())
    }

    fn product(id: &str, price: i64) -> Product {
        Product::new(id, format!("Product {id}"), Decimal::from(price))
    }

    fn user_key(uid: &str) -> PartitionKey {
        PartitionKey::for_user(&UserId::new(uid))
    }

    #[tokio::test]
    async fn test_add_increments_existing_line() {
        let h = start();
        assert_eq!(h.cart.add_item(product("a", 10)).await.unwrap(), AddOutcome::Added);
        assert_eq!(
            h.cart.add_item(product("a", 10)).await.unwrap(),
            AddOutcome::QuantityIncreased { quantity: 2 }
        );
        let items = h.cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_total_is_sum_of_lines() {
        let h = start();
        h.cart.add_item(product("a", 10)).await.unwrap();
        h.cart.add_item(product("b", 5)).await.unwrap();
        h.cart.set_quantity(&ProductId::new("a"), 2).await.unwrap();
        h.cart.set_quantity(&ProductId::new("b"), 3).await.unwrap();

        assert_eq!(h.cart.total(), Decimal::from(35));
        assert_eq!(h.cart.item_count(), 5);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_removes_line() {
        let h = start();
        h.cart.add_item(product("a", 10)).await.unwrap();
        h.cart.add_item(product("b", 10)).await.unwrap();

        h.cart.set_quantity(&ProductId::new("a"), 0).await.unwrap();
        h.cart.set_quantity(&ProductId::new("b"), -3).await.unwrap();
        assert!(h.cart.items().is_empty());

        // Absent lines are not created by a quantity change
        h.cart.set_quantity(&ProductId::new("c"), 4).await.unwrap();
        assert!(h.cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_item_is_noop() {
        let h = start();
        h.cart.add_item(product("a", 10)).await.unwrap();
        assert!(!h.cart.remove_item(&ProductId::new("zzz")).await.unwrap());
        assert!(h.cart.remove_item(&ProductId::new("a")).await.unwrap());
        assert!(h.cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_persist_and_clear_removes_slot() {
        let h = start();
        h.cart.add_item(product("a", 10)).await.unwrap();
        h.cart.flush().await.unwrap();
        let raw = h.slots.raw(&PartitionKey::guest()).unwrap();
        assert!(raw.contains("\"productId\":\"a\""));

        h.cart.clear().await.unwrap();
        h.cart.flush().await.unwrap();
        assert!(!h.slots.contains(&PartitionKey::guest()));
        assert!(h.cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_partition_round_trip_restores_each_cart() {
        let h = start();
        h.cart.activate(user_key("a")).await.unwrap();
        h.cart.add_item(product("x", 1)).await.unwrap();
        h.cart.add_item(product("x", 1)).await.unwrap();

        h.cart.activate(user_key("b")).await.unwrap();
        assert!(h.cart.items().is_empty());
        h.cart.add_item(product("y", 1)).await.unwrap();

        h.cart.activate(user_key("a")).await.unwrap();
        let items = h.cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new("x"));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(h.cart.key(), user_key("a"));
    }

    #[tokio::test]
    async fn test_guest_lines_do_not_leak_into_user_cart() {
        let h = start();
        h.cart.add_item(product("g", 1)).await.unwrap();
        h.cart.activate(user_key("u1")).await.unwrap();
        assert!(h.cart.items().is_empty());

        h.cart.activate(PartitionKey::guest()).await.unwrap();
        assert_eq!(h.cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_slot_loads_as_empty() {
        let slots = MemorySlotStore::new();
        slots.insert_raw(user_key("u1"), "[{\"broken\":");
        let h = start_with(slots);

        h.cart.activate(user_key("u1")).await.unwrap();
        assert!(h.cart.items().is_empty());
        assert_eq!(h.cart.key(), user_key("u1"));
    }

    #[tokio::test]
    async fn test_invalid_stored_lines_are_dropped() {
        let slots = MemorySlotStore::new();
        slots.insert_raw(
            PartitionKey::guest(),
            r#"[{"productId":"a","name":"A","price":"1","quantity":0},
                {"productId":"b","name":"B","price":"2","quantity":1},
                {"productId":"b","name":"B","price":"2","quantity":4}]"#,
        );
        let h = start_with(slots);
        h.cart.flush().await.unwrap();

        let items = h.cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new("b"));
        assert_eq!(items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_persistence_outage_is_invisible_to_callers() {
        let slots = MemorySlotStore::new();
        slots.set_offline(true);
        let h = start_with(slots);

        h.cart.add_item(product("a", 3)).await.unwrap();
        h.cart.activate(user_key("u1")).await.unwrap();
        h.cart.add_item(product("b", 4)).await.unwrap();
        assert_eq!(h.cart.total(), Decimal::from(4));
    }

    #[tokio::test]
    async fn test_concurrent_adds_never_duplicate_lines() {
        let h = start();
        let mut tasks = Vec::new();
        for _ in 0..20 {
            let cart = h.cart.clone();
            tasks.push(tokio::spawn(async move {
                cart.add_item(product("hot", 2)).await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        let items = h.cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 20);
    }

    #[tokio::test]
    async fn test_notices_distinguish_added_from_updated() {
        let h = start();
        let mut notices = h.notifier.subscribe();
        h.cart.add_item(product("a", 1)).await.unwrap();
        h.cart.add_item(product("a", 1)).await.unwrap();

        let first = notices.recv().await.unwrap();
        assert_eq!(first.level, NoticeLevel::Success);
        assert_eq!(first.message, "Product a added to cart!");
        let second = notices.recv().await.unwrap();
        assert_eq!(second.message, "Product a quantity updated in cart!");
    }

    #[tokio::test]
    async fn test_quantities_are_capped_and_counts_do_not_overflow() {
        let h = start();
        h.cart.add_item(product("a", 1)).await.unwrap();
        h.cart.add_item(product("b", 1)).await.unwrap();

        h.cart
            .set_quantity(&ProductId::new("a"), 3_000_000_000)
            .await
            .unwrap();
        h.cart
            .set_quantity(&ProductId::new("b"), 3_000_000_000)
            .await
            .unwrap();
        assert_eq!(
            h.cart.item_count(),
            2 * u64::from(MAX_LINE_QUANTITY)
        );

        assert_eq!(
            h.cart.add_item(product("a", 1)).await.unwrap(),
            AddOutcome::QuantityIncreased {
                quantity: MAX_LINE_QUANTITY
            }
        );
        let snapshot = h.cart.snapshot();
        assert!(snapshot.items.iter().all(CartItem::is_valid));
        assert_eq!(
            snapshot.item(&ProductId::new("a")).unwrap().quantity,
            MAX_LINE_QUANTITY
        );
    }

    #[tokio::test]
    async fn test_clear_partition_skips_inactive_partition() {
        let h = start();
        h.cart.activate(user_key("a")).await.unwrap();
        h.cart.add_item(product("x", 1)).await.unwrap();
        h.cart.activate(user_key("b")).await.unwrap();
        h.cart.add_item(product("y", 1)).await.unwrap();

        assert!(!h.cart.clear_partition(&user_key("a")).await.unwrap());
        assert!(h.cart.snapshot().item(&ProductId::new("y")).is_some());

        assert!(h.cart.clear_partition(&user_key("b")).await.unwrap());
        assert!(h.cart.items().is_empty());

        h.cart.activate(user_key("a")).await.unwrap();
        assert!(h.cart.snapshot().item(&ProductId::new("x")).is_some());
    }

    #[tokio::test]
    async fn test_follow_identity_switches_on_resolution_only() {
        let h = start();
        let (auth, watcher) = watch::channel(AuthState::Resolving);
        let _follow = h.cart.follow_identity(watcher);

        h.cart.add_item(product("g", 1)).await.unwrap();
        assert!(h.cart.key().is_guest());

        auth.send_replace(AuthState::SignedIn(crate::model::Identity {
            id: UserId::new("u1"),
            email: "u1@shop.test".into(),
            display_name: None,
            role: Some(crate::model::Role::Customer),
        }));
        let snapshot = h.cart.wait_for_partition(&user_key("u1")).await.unwrap();
        assert!(snapshot.is_empty());

        auth.send_replace(AuthState::SignedOut);
        let snapshot = h
            .cart
            .wait_for_partition(&PartitionKey::guest())
            .await
            .unwrap();
        assert_eq!(snapshot.items.len(), 1);
    }
}
