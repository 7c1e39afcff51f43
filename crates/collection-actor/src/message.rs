//! # Generic Messages
//!
//! Requests sent from a [`ResourceClient`](crate::ResourceClient) to a
//! [`ResourceActor`](crate::ResourceActor). Every request carries a oneshot sender for its reply.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Request accepted by a collection actor.
///
/// - **Create**: store-assigned id, returns the new id.
/// - **Put**: caller-chosen id, inserts or fully replaces the entity.
/// - **Get** / **List**: reads of one entity or of the whole collection.
/// - **Update**: folds a [`ActorEntity::Update`] payload into an existing entity.
/// - **Delete**: permanent removal.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Put {
        id: T::Id,
        params: T::Create,
        respond_to: Response<()>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
}
