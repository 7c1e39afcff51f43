//! # Generic Client
//!
//! This module defines the generic client for communicating with collection actors.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::feed::{Snapshot, Subscription};
use crate::message::ResourceRequest;
use tokio::sync::{mpsc, oneshot, watch};

/// A type-safe client for interacting with a `ResourceActor`.
///
/// Holds the mailbox sender and a receiver of the actor's snapshot feed, so it is cheap to clone
/// and share across tasks. The actor shuts down once every clone is dropped; open subscriptions do
/// not keep it alive.
#[derive(Clone)]
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    snapshots: watch::Receiver<Snapshot<T>>,
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(
        sender: mpsc::Sender<ResourceRequest<T>>,
        snapshots: watch::Receiver<Snapshot<T>>,
    ) -> Self {
        Self { sender, snapshots }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<R, FrameworkError>>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn put(&self, id: T::Id, params: T::Create) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Put {
            id,
            params,
            respond_to,
        })
        .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List { respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    /// Opens a live subscription. The first `next()` yields the current snapshot.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription::new(self.snapshots.clone())
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshots.borrow().clone()
    }
}
