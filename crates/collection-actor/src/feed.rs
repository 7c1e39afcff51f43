//! # Live Snapshot Feed
//!
//! Every collection actor publishes a [`Snapshot`] of its whole collection after each successful
//! mutation. Readers hold a [`Subscription`], which yields the current snapshot first and then
//! every later one. Intermediate snapshots may be coalesced: a slow reader always wakes up to the
//! latest version, never to a stale one.
//!
//! Cancellation goes through an [`Unsubscribe`] handle. Cancelling is idempotent, it never
//! touches writes that are already queued at the actor, and dropping the subscription cancels it.

use futures::Stream;
use std::sync::Arc;
use tokio::sync::watch;

/// Full contents of a collection at one version.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Monotonic counter, bumped once per successful mutation.
    pub version: u64,
    pub items: Arc<Vec<T>>,
}

impl<T> Snapshot<T> {
    pub fn empty() -> Self {
        Self {
            version: 0,
            items: Arc::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cancels the subscription it was taken from. Cheap to clone, safe to call more than once.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
    signal: Arc<watch::Sender<bool>>,
}

impl Unsubscribe {
    pub fn cancel(&self) {
        self.signal.send_if_modified(|cancelled| {
            let first = !*cancelled;
            *cancelled = true;
            first
        });
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }
}

/// A standing read of a collection.
pub struct Subscription<T> {
    snapshots: watch::Receiver<Snapshot<T>>,
    cancelled: watch::Receiver<bool>,
    handle: Unsubscribe,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(mut snapshots: watch::Receiver<Snapshot<T>>) -> Self {
        // The current snapshot counts as unseen so the first `next` delivers it immediately.
        snapshots.mark_changed();
        let (signal, cancelled) = watch::channel(false);
        Self {
            snapshots,
            cancelled,
            handle: Unsubscribe {
                signal: Arc::new(signal),
            },
        }
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the subscription is cancelled or the actor has shut down.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        if self.handle.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancelled.changed() => None,
            changed = self.snapshots.changed() => match changed {
                Ok(()) => Some(self.snapshots.borrow_and_update().clone()),
                Err(_) => None,
            },
        }
    }

    /// The most recent snapshot, without waiting and without marking it seen.
    pub fn latest(&self) -> Snapshot<T> {
        self.snapshots.borrow().clone()
    }

    pub fn unsubscribe_handle(&self) -> Unsubscribe {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Adapts the subscription into a `Stream` that ends on cancel or shutdown.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> + Send {
        async_stream::stream! {
            let mut subscription = self;
            while let Some(snapshot) = subscription.next().await {
                yield snapshot;
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn publish(sender: &watch::Sender<Snapshot<u32>>, version: u64, items: Vec<u32>) {
        sender.send_replace(Snapshot {
            version,
            items: Arc::new(items),
        });
    }

    #[tokio::test]
    async fn test_first_next_delivers_current_snapshot() {
        let (sender, receiver) = watch::channel(Snapshot::empty());
        publish(&sender, 1, vec![7]);

        let mut subscription = Subscription::new(receiver);
        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(*snapshot.items, vec![7]);
    }

    #[tokio::test]
    async fn test_slow_reader_sees_latest_version() {
        let (sender, receiver) = watch::channel(Snapshot::empty());
        let mut subscription = Subscription::new(receiver);
        subscription.next().await.unwrap();

        publish(&sender, 1, vec![1]);
        publish(&sender, 2, vec![1, 2]);

        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_wakes_reader() {
        let (_sender, receiver) = watch::channel(Snapshot::<u32>::empty());
        let mut subscription = Subscription::new(receiver);
        subscription.next().await.unwrap();

        let handle = subscription.unsubscribe_handle();
        let reader = tokio::spawn(async move { subscription.next().await });

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(reader.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_feed_ends_when_publisher_drops() {
        let (sender, receiver) = watch::channel(Snapshot::<u32>::empty());
        let mut subscription = Subscription::new(receiver);
        subscription.next().await.unwrap();

        drop(sender);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_into_stream_yields_until_cancelled() {
        let (sender, receiver) = watch::channel(Snapshot::empty());
        let subscription = Subscription::new(receiver);
        let handle = subscription.unsubscribe_handle();
        let mut stream = Box::pin(subscription.into_stream());

        assert_eq!(stream.next().await.unwrap().version, 0);
        publish(&sender, 1, vec![3]);
        assert_eq!(stream.next().await.unwrap().version, 1);

        handle.cancel();
        assert!(stream.next().await.is_none());
    }
}
