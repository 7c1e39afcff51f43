//! # Lifecycle & Wiring
//!
//! Starting, wiring and stopping the storefront's tasks.
//!
//! ## Layout
//!
//! - [`RemoteStore`] - the shared `orders` and `users` collection actors, one per process.
//! - [`Session`] - one per browsing session: identity resolver, slot writer, cart actor, the
//!   cart's identity follower, plus the order manager, gate and notices that sit on top.
//! - [`Storefront`] - the store plus the configured slot backend; hands out sessions.
//!
//! Components receive their collaborators at construction. Nothing is global except the
//! tracing subscriber installed by [`setup_tracing`].
//!
//! ## Shutdown
//!
//! Dropping the last client of an actor closes its mailbox; the actor drains what is queued
//! and exits. Shut sessions down first, then the store:
//!
//! ```rust
//! use storefront::config::StorefrontConfig;
//! use storefront::lifecycle::Storefront;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storefront = Storefront::start(StorefrontConfig::default());
//!     let session = storefront.open_session();
//!     session.shutdown().await.unwrap();
//!     storefront.shutdown().await.unwrap();
//! }
//! ```

pub mod remote;
pub mod session;
pub mod tracing;

pub use remote::RemoteStore;
pub use session::{Session, SessionError};
pub use tracing::setup_tracing;

use crate::cart_actor::{FileSlotStore, MemorySlotStore, SlotStore};
use crate::config::StorefrontConfig;
use ::tracing::{error, info};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("{component} task failed: {source}")]
    TaskFailed {
        component: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

async fn join_all(component: &'static str, handles: Vec<JoinHandle<()>>) -> Result<(), ShutdownError> {
    for handle in handles {
        if let Err(source) = handle.await {
            error!(component, error = %source, "Task failed");
            return Err(ShutdownError::TaskFailed { component, source });
        }
    }
    Ok(())
}

/// The process-wide half of the storefront.
pub struct Storefront {
    remote: RemoteStore,
    slots: Arc<dyn SlotStore>,
    config: StorefrontConfig,
}

impl Storefront {
    /// Starts the remote store. Carts go to `config.cart_dir` when set, to memory otherwise.
    pub fn start(config: StorefrontConfig) -> Self {
        let slots: Arc<dyn SlotStore> = match &config.cart_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Cart slots on disk");
                Arc::new(FileSlotStore::new(dir))
            }
            None => {
                info!("Cart slots in memory");
                Arc::new(MemorySlotStore::new())
            }
        };
        Self::with_slots(config, slots)
    }

    pub fn with_slots(config: StorefrontConfig, slots: Arc<dyn SlotStore>) -> Self {
        Self {
            remote: RemoteStore::start(config.mailbox_capacity),
            slots,
            config,
        }
    }

    pub fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Starts a new browsing session. Sessions share the remote store and the slot backend.
    pub fn open_session(&self) -> Session {
        Session::start(&self.remote, self.slots.clone(), &self.config)
    }

    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        self.remote.shutdown().await
    }
}
