//! Live list of all orders, decoded and sorted.

use crate::clients::orders_from_snapshot;
use crate::document_actor::Document;
use crate::model::Order;
use collection_actor::{Subscription, Unsubscribe};
use futures::Stream;

/// A standing query over the `orders` collection.
///
/// Every delivery is the full current set, newest first. Intermediate collection states may be
/// skipped when they change faster than the reader consumes them. Dropping the feed cancels it.
pub struct OrderFeed {
    inner: Subscription<Document>,
}

impl OrderFeed {
    pub(crate) fn new(inner: Subscription<Document>) -> Self {
        Self { inner }
    }

    /// Waits for the next delivery. The first call returns the current set immediately.
    /// `None` once cancelled or once the collection has shut down.
    pub async fn next(&mut self) -> Option<Vec<Order>> {
        self.inner
            .next()
            .await
            .map(|snapshot| orders_from_snapshot(&snapshot))
    }

    /// The current set, without waiting.
    pub fn current(&self) -> Vec<Order> {
        orders_from_snapshot(&self.inner.latest())
    }

    /// Stops delivery. Calling it again is a no-op.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// A handle that can cancel this feed from elsewhere, e.g. on view teardown.
    pub fn unsubscribe_handle(&self) -> Unsubscribe {
        self.inner.unsubscribe_handle()
    }

    pub fn into_stream(self) -> impl Stream<Item = Vec<Order>> + Send {
        futures::StreamExt::map(self.inner.into_stream(), |snapshot| {
            orders_from_snapshot(&snapshot)
        })
    }
}
