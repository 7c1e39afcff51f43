use super::ShutdownError;
use crate::clients::{OrderClient, UserClient};
use crate::document_actor;
use tokio::task::JoinHandle;
use tracing::info;

/// The shared remote document store: one `orders` and one `users` collection actor per process.
///
/// Every session holds clones of these clients, so the actors only stop once every session has
/// shut down and [`shutdown`](Self::shutdown) has dropped the last clients.
pub struct RemoteStore {
    pub orders: OrderClient,
    pub users: UserClient,
    handles: Vec<JoinHandle<()>>,
}

impl RemoteStore {
    pub fn start(buffer_size: usize) -> Self {
        let (orders_actor, orders) = document_actor::orders_collection(buffer_size);
        let (users_actor, users) = document_actor::users_collection(buffer_size);

        // Collections have no dependencies (Context = ())
        let orders_handle = tokio::spawn(orders_actor.run(()));
        let users_handle = tokio::spawn(users_actor.run(()));
        info!("Remote store started");

        Self {
            orders,
            users,
            handles: vec![orders_handle, users_handle],
        }
    }

    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        info!("Shutting down remote store...");
        drop(self.orders);
        drop(self.users);
        super::join_all("remote store", self.handles).await?;
        info!("Remote store shutdown complete.");
        Ok(())
    }
}
