//! # Collection Actor
//!
//! `ResourceActor` is the server half of a collection. It owns every entity of one type, applies
//! requests one at a time in mailbox order, and republishes the whole collection on its snapshot
//! feed after each successful mutation.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::feed::Snapshot;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

type IdGenerator<Id> = Box<dyn Fn() -> Id + Send + Sync>;

/// The generic actor that manages one collection of entities.
///
/// **Concurrency Model**:
/// The actor processes its mailbox sequentially, so the store needs no lock. The mailbox order is
/// the only ordering guarantee: two writes to the same entity resolve last-write-wins.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new(buffer, next_id)` returns the actor and its client.
/// 2.  **Wire**: pass dependencies into `actor.run(context)`.
/// 3.  **Run**: spawn the run loop on the runtime.
///
/// ```rust
/// use collection_actor::{ActorEntity, ResourceActor};
/// use async_trait::async_trait;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// #[derive(Clone, Debug)] struct Note { id: u32, text: String }
/// #[derive(Debug)] struct NoteCreate(String);
/// #[derive(Debug)] struct NoteUpdate(String);
/// #[derive(Debug, thiserror::Error)] #[error("note error")] struct NoteError;
///
/// #[async_trait]
/// impl ActorEntity for Note {
///     type Id = u32;
///     type Create = NoteCreate;
///     type Update = NoteUpdate;
///     type Context = ();
///     type Error = NoteError;
///
///     fn from_create_params(id: u32, params: NoteCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id, text: params.0 })
///     }
///     async fn on_update(&mut self, update: NoteUpdate, _: &()) -> Result<(), Self::Error> {
///         self.text = update.0;
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let counter = AtomicU32::new(1);
///     let (actor, client) = ResourceActor::<Note>::new(10, move || counter.fetch_add(1, Ordering::SeqCst));
///     tokio::spawn(actor.run(()));
///
///     let id = client.create(NoteCreate("hello".into())).await.unwrap();
///     assert_eq!(client.get(id).await.unwrap().unwrap().text, "hello");
/// }
/// ```
///
/// # Operations
///
/// * **Create**: draws an id from `next_id`, builds the entity, runs `on_create`, inserts it.
/// * **Put**: builds the entity under the given id, runs `on_create`, inserts or replaces.
/// * **Get** / **List**: clones out of the store.
/// * **Update**: runs `on_update` on a copy and stores it only if the hook succeeds.
/// * **Delete**: runs `on_delete`, then removes.
///
/// Every successful Create, Put, Update and Delete publishes a new [`Snapshot`].
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id: IdGenerator<T::Id>,
    feed: watch::Sender<Snapshot<T>>,
    version: u64,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// * `buffer_size` - capacity of the mailbox. When full, client calls wait for space.
    /// * `next_id` - id generator used by `create`. It must never return an id twice.
    pub fn new(
        buffer_size: usize,
        next_id: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (feed, snapshots) = watch::channel(Snapshot::empty());
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: Box::new(next_id),
            feed,
            version: 0,
        };
        let client = ResourceClient::new(sender, snapshots);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    ///
    /// The `context` argument is handed to every entity hook.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = (self.next_id)();
                    let result = self.insert(id.clone(), params, &context).await;
                    match &result {
                        Ok(()) => info!(entity_type, %id, size = self.store.len(), "Created"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result.map(|()| id));
                }
                ResourceRequest::Put {
                    id,
                    params,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?params, "Put");
                    let result = self.insert(id.clone(), params, &context).await;
                    match &result {
                        Ok(()) => info!(entity_type, %id, size = self.store.len(), "Stored"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Put failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { respond_to } => {
                    debug!(entity_type, size = self.store.len(), "List");
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(current) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let mut item = current.clone();
                    if let Err(e) = item.on_update(update, &context).await {
                        warn!(entity_type, %id, error = %e, "Update failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.store.insert(id.clone(), item.clone());
                    self.publish();
                    info!(entity_type, %id, "Updated");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let Some(item) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = item.on_delete(&context).await {
                        warn!(entity_type, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.store.remove(&id);
                    self.publish();
                    info!(entity_type, %id, size = self.store.len(), "Deleted");
                    let _ = respond_to.send(Ok(()));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    async fn insert(
        &mut self,
        id: T::Id,
        params: T::Create,
        context: &T::Context,
    ) -> Result<(), FrameworkError> {
        let mut item = T::from_create_params(id.clone(), params)
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;
        item.on_create(context)
            .await
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;
        self.store.insert(id, item);
        self.publish();
        Ok(())
    }

    fn publish(&mut self) {
        self.version += 1;
        let items: Vec<T> = self.store.values().cloned().collect();
        self.feed.send_replace(Snapshot {
            version: self.version,
            items: Arc::new(items),
        });
    }
}
