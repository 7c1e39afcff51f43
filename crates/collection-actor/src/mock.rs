//! # Mock Clients
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are answered from a
//! queue of expectations instead of a running actor. It also owns the client's snapshot feed, so
//! tests can push arbitrary collection contents (including ones a real actor would never hold)
//! to subscribers.
//!
//! | | MockClient | Real Actor |
//! |---|---|---|
//! | **State** | Scripted replies | Real store |
//! | **Error Injection** | `return_err(FrameworkError::ActorClosed)` | Drop the actor |
//! | **Use Case** | Logic around a client | The actor itself, full flows |
//!
//! ```rust
//! use collection_actor::mock::MockClient;
//! use collection_actor::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Tag { id: u32 }
//! #[derive(Debug)] struct TagCreate;
//! #[derive(Debug)] struct TagUpdate;
//! #[derive(Debug, thiserror::Error)] #[error("Err")] struct TagError;
//!
//! #[async_trait]
//! impl ActorEntity for Tag {
//!     type Id = u32; type Create = TagCreate; type Update = TagUpdate;
//!     type Context = (); type Error = TagError;
//!     fn from_create_params(id: u32, _: TagCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     async fn on_update(&mut self, _: TagUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Tag>::new();
//!     let client = mock.client();
//!
//!     mock.expect_get(1).return_err(FrameworkError::ActorClosed);
//!
//!     let result = client.get(1).await;
//!     assert!(matches!(result, Err(FrameworkError::ActorClosed)));
//!     mock.verify();
//! }
//! ```

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::feed::Snapshot;
use crate::message::ResourceRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Put {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
    Update {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking for fluent testing.
///
/// Expectations are consumed in order. A request that does not match the next expectation
/// panics the mock task, which the caller observes as `FrameworkError::ActorDropped`.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    feed: watch::Sender<Snapshot<T>>,
    version: u64,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let (feed, snapshots) = watch::channel(Snapshot::empty());
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queue.lock().unwrap().pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::Get { id, respond_to },
                        Some(Expectation::Get { id: expected, response }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Put { id, respond_to, .. },
                        Some(Expectation::Put { id: expected, response }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::List { respond_to }, Some(Expectation::List { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Update { id, respond_to, .. },
                        Some(Expectation::Update { id: expected, response }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Delete { id, respond_to },
                        Some(Expectation::Delete { id: expected, response }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    _ => {
                        panic!("Unexpected request or expectation mismatch");
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender, snapshots),
            expectations,
            feed,
            version: 0,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` for `id`. A request for any other id fails the mock.
    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.builder(move |response| Expectation::Get { id, response })
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        self.builder(|response| Expectation::Create { response })
    }

    pub fn expect_put(&mut self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::Put { id, response })
    }

    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(|response| Expectation::List { response })
    }

    pub fn expect_update(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(move |response| Expectation::Update { id, response })
    }

    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::Delete { id, response })
    }

    /// Pushes a snapshot to every subscriber of the mock's client.
    pub fn publish(&mut self, items: Vec<T>) {
        self.version += 1;
        self.feed.send_replace(Snapshot {
            version: self.version,
            items: Arc::new(items),
        });
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    fn builder<R>(
        &self,
        wrap: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            wrap: Box::new(wrap),
            expectations: self.expectations.clone(),
        }
    }
}

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    wrap: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send>,
    expectations: Expectations<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.expectations
            .lock()
            .unwrap()
            .push_back((self.wrap)(Ok(value)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        self.expectations
            .lock()
            .unwrap()
            .push_back((self.wrap)(Err(error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Tag {
        id: u32,
        label: String,
    }

    #[derive(Debug)]
    struct TagCreate {
        label: String,
    }

    #[derive(Debug)]
    struct TagUpdate {
        label: String,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Tag error")]
    struct TagError;

    #[async_trait]
    impl ActorEntity for Tag {
        type Id = u32;
        type Create = TagCreate;
        type Update = TagUpdate;
        type Context = ();
        type Error = TagError;

        fn from_create_params(id: u32, params: TagCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                label: params.label,
            })
        }

        async fn on_update(
            &mut self,
            update: TagUpdate,
            _ctx: &Self::Context,
        ) -> Result<(), Self::Error> {
            self.label = update.label;
            Ok(())
        }
    }

    fn tag(id: u32, label: &str) -> Tag {
        Tag {
            id,
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<Tag>::new();

        mock.expect_create().return_ok(1);
        mock.expect_get(1).return_ok(Some(tag(1, "sale")));
        mock.expect_update(1)
            .return_err(FrameworkError::NotFound("1".to_string()));
        mock.expect_list().return_ok(vec![tag(1, "sale")]);

        let client = mock.client();

        let id = client
            .create(TagCreate {
                label: "sale".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(id, 1);

        let fetched = client.get(1).await.unwrap();
        assert_eq!(fetched.unwrap().label, "sale");

        let updated = client
            .update(
                1,
                TagUpdate {
                    label: "new".to_string(),
                },
            )
            .await;
        assert!(matches!(updated, Err(FrameworkError::NotFound(_))));

        assert_eq!(client.list().await.unwrap().len(), 1);

        mock.verify();
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let mut mock = MockClient::<Tag>::new();
        let mut subscription = mock.client().subscribe();
        assert!(subscription.next().await.unwrap().is_empty());

        mock.publish(vec![tag(1, "a"), tag(2, "b")]);

        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_request_for_another_id_fails_the_mock() {
        let mut mock = MockClient::<Tag>::new();
        mock.expect_delete(1).return_ok(());

        let result = mock.client().delete(2).await;
        assert!(matches!(result, Err(FrameworkError::ActorDropped)));
    }

    #[tokio::test]
    async fn test_unexpected_request_reports_dropped_actor() {
        let mock = MockClient::<Tag>::new();
        let result = mock.client().delete(9).await;
        assert!(matches!(result, Err(FrameworkError::ActorDropped)));
    }
}
