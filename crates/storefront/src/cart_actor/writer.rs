//! FIFO slot writer.
//!
//! Every slot operation of a cart goes through one worker task, so operations hit the backend in
//! the order they were issued: a later save is never overtaken by an earlier, slower one, and a
//! load queued after a save of the same key observes that save.

use super::error::SlotError;
use super::slot::SlotStore;
use crate::model::{CartItem, PartitionKey};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

type Loaded = Result<Option<Vec<CartItem>>, SlotError>;

#[derive(Debug)]
enum SlotJob {
    Load {
        key: PartitionKey,
        respond_to: oneshot::Sender<Loaded>,
    },
    Save {
        key: PartitionKey,
        items: Vec<CartItem>,
    },
    Remove {
        key: PartitionKey,
    },
    Flush {
        respond_to: oneshot::Sender<()>,
    },
}

pub struct SlotWorker {
    receiver: mpsc::Receiver<SlotJob>,
    store: Arc<dyn SlotStore>,
}

/// Enqueues slot operations. Saves and removes are fire-and-forget; failures are logged.
#[derive(Clone)]
pub struct SlotWriter {
    sender: mpsc::Sender<SlotJob>,
}

impl SlotWorker {
    pub fn new(buffer_size: usize, store: Arc<dyn SlotStore>) -> (Self, SlotWriter) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver, store }, SlotWriter { sender })
    }

    pub async fn run(mut self) {
        info!("Slot writer started");
        while let Some(job) = self.receiver.recv().await {
            match job {
                SlotJob::Load { key, respond_to } => {
                    let loaded = self.store.load(&key).await;
                    debug!(%key, ok = loaded.is_ok(), "Slot loaded");
                    let _ = respond_to.send(loaded);
                }
                SlotJob::Save { key, items } => {
                    if let Err(e) = self.store.save(&key, &items).await {
                        warn!(%key, error = %e, "Cart save failed");
                    }
                }
                SlotJob::Remove { key } => {
                    if let Err(e) = self.store.remove(&key).await {
                        warn!(%key, error = %e, "Cart slot removal failed");
                    }
                }
                SlotJob::Flush { respond_to } => {
                    let _ = respond_to.send(());
                }
            }
        }
        info!("Slot writer shutdown");
    }
}

impl SlotWriter {
    pub async fn load(&self, key: PartitionKey) -> Loaded {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SlotJob::Load { key, respond_to })
            .await
            .map_err(|_| SlotError::WriterClosed)?;
        response.await.map_err(|_| SlotError::WriterClosed)?
    }

    pub async fn save(&self, key: PartitionKey, items: Vec<CartItem>) {
        if self.sender.send(SlotJob::Save { key, items }).await.is_err() {
            warn!("Slot writer closed, cart not saved");
        }
    }

    pub async fn remove(&self, key: PartitionKey) {
        if self.sender.send(SlotJob::Remove { key }).await.is_err() {
            warn!("Slot writer closed, cart slot not removed");
        }
    }

    /// Resolves once every operation queued before it has reached the backend.
    pub async fn flush(&self) {
        let (respond_to, response) = oneshot::channel();
        if self.sender.send(SlotJob::Flush { respond_to }).await.is_ok() {
            let _ = response.await;
        }
    }
}
