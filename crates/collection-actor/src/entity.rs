//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract every document type must satisfy to be owned by a
//! [`ResourceActor`](crate::ResourceActor). It fixes the id, payload, context and error types
//! for one collection and exposes lifecycle hooks the actor calls while it processes requests.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_delete`]
//!
//! Both default to `Ok(())`. Only [`ActorEntity::on_update`] must be written by hand, because
//! only the entity knows how an update payload is folded into its state.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any entity stored in a collection actor must implement.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they may await other actors. The `Context` type is injected
/// into every hook when the actor starts (`run(context)`), not when it is constructed.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// Unique identifier of an entity within its collection.
    ///
    /// Ids are produced by the id generator handed to [`ResourceActor::new`](crate::ResourceActor::new)
    /// for `create`, or supplied by the caller for `put`.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// The data required to create (or fully replace) an instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One error enum per collection, shared by every hook.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the id and payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called after the entity is built and before it becomes visible in the store.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received. An error leaves the stored entity untouched.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed from the store.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }
}
