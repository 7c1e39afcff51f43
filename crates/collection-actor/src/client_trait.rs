//! # ActorClient Trait
//!
//! Shared read operations for collection-specific client wrappers. Writes stay on the wrappers
//! themselves, since that is where a collection enforces its own rules.
use crate::{ActorEntity, FrameworkError, ResourceClient, Subscription};
use async_trait::async_trait;

/// Trait for collection-specific clients to inherit the standard reads.
///
/// # Example
///
/// ```rust
/// use collection_actor::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Tag { id: u32 }
/// #[derive(Debug)] struct TagCreate;
/// #[derive(Debug)] struct TagUpdate;
/// #[derive(Debug, thiserror::Error)] #[error("{0}")] struct TagError(String);
///
/// #[async_trait]
/// impl ActorEntity for Tag {
///     type Id = u32; type Create = TagCreate; type Update = TagUpdate;
///     type Context = (); type Error = TagError;
///     fn from_create_params(id: u32, _: TagCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
///     async fn on_update(&mut self, _: TagUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// struct TagClient { inner: ResourceClient<Tag> }
///
/// impl ActorClient<Tag> for TagClient {
///     type Error = TagError;
///     fn inner(&self) -> &ResourceClient<Tag> { &self.inner }
///     fn map_error(e: FrameworkError) -> Self::Error { TagError(e.to_string()) }
/// }
///
/// async fn usage(client: TagClient) {
///     // get(), list() and subscribe() are provided automatically
///     let _ = client.get(1).await;
///     let _ = client.list().await;
///     let _feed = client.subscribe();
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The collection-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the collection-specific error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by id.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every entity in the collection, in no particular order.
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list().await.map_err(Self::map_error)
    }

    /// Open a live subscription to the collection.
    fn subscribe(&self) -> Subscription<T> {
        self.inner().subscribe()
    }
}
