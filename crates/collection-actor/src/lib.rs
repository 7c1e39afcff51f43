//! # Collection Actor
//!
//! Building blocks for in-process document collections run as Tokio actors. Each collection is
//! one [`ResourceActor`] that owns its entities, applies writes strictly in mailbox order and
//! publishes the full collection to live subscribers after every change.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - what a document is and how updates fold into it
//! 2. **Runtime Layer** ([`ResourceActor`]) - message processing, id assignment, snapshot feed
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - typed requests and reads
//! 4. **Feed Layer** ([`Subscription`], [`Unsubscribe`]) - cancellable live reads
//!
//! ## Context Injection
//!
//! Dependencies reach an entity's hooks through `run(context)`, not through `new()`. Actors can
//! therefore be constructed first and wired together afterwards.
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task and handles one request at a time
//! - Different collections run in parallel
//! - Readers never block writers: subscriptions read a `watch` channel, not the mailbox
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers a real `ResourceClient` from scripted expectations and lets a
//! test publish snapshots directly.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod feed;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use feed::{Snapshot, Subscription, Unsubscribe};
pub use message::{ResourceRequest, Response};
