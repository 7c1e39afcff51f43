//! # Document Actor
//!
//! The in-process remote document store. Each collection (`orders`, `users`) is one
//! [`ResourceActor<Document>`](collection_actor::ResourceActor) that owns its documents, applies
//! writes in arrival order and publishes full snapshots to live subscribers.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](collection_actor::ActorEntity) implementation for [`Document`]
//! - [`error`] - [`DocumentError`] for encoding and decoding
//! - [`orders_collection`], [`users_collection`] - factories returning the actor and its typed client
//!
//! ## Usage
//!
//! ```rust
//! use storefront::document_actor;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, orders) = document_actor::orders_collection(32);
//!     tokio::spawn(actor.run(()));
//!     let _feed = orders.subscribe_documents();
//! }
//! ```

pub mod entity;
pub mod error;

pub use entity::{to_fields, Document, FieldPatch, Fields};
pub use error::DocumentError;

use crate::clients::{OrderClient, UserClient};
use collection_actor::ResourceActor;
use uuid::Uuid;

/// Store-assigned ids are random, so they carry no ordering.
fn next_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Creates the `orders` collection actor and its client.
pub fn orders_collection(buffer_size: usize) -> (ResourceActor<Document>, OrderClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, next_document_id);
    (actor, OrderClient::new(generic_client))
}

/// Creates the `users` collection actor and its client. Records are written under their uid.
pub fn users_collection(buffer_size: usize) -> (ResourceActor<Document>, UserClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, next_document_id);
    (actor, UserClient::new(generic_client))
}
