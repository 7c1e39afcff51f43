//! # Identity Actor
//!
//! Turns raw sessions from the external identity provider into resolved identities.
//!
//! ## Overview
//!
//! The resolver consumes session events (`Some(session)` on sign-in, `None` on sign-out) from
//! its mailbox one at a time. For each sign-in it reads the user record from the `users`
//! collection to learn the role; a missing, unreadable or malformed record falls back to
//! `customer`. The outcome is published as an [`AuthState`] on a `watch` channel, so every
//! consumer (gate, cart, order manager) sees the same current value.
//!
//! Events are resolved strictly in arrival order: a slow lookup for an old session can never
//! overwrite the state of a newer one.
//!
//! ## Usage
//!
//! ```rust
//! use storefront::{document_actor, identity_actor};
//! use storefront::model::{AuthSession, AuthState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (users_actor, users) = document_actor::users_collection(8);
//!     tokio::spawn(users_actor.run(()));
//!
//!     let (resolver, identity) = identity_actor::new(8, users);
//!     tokio::spawn(resolver.run());
//!
//!     let state = identity.sign_in(AuthSession::new("u1", "ann@shop.test")).await.unwrap();
//!     assert!(matches!(state, AuthState::SignedIn(_)));
//! }
//! ```

pub mod error;

pub use error::*;

use crate::clients::UserClient;
use crate::model::{AuthSession, AuthState, Identity, Role, UserRecord};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
enum SessionEvent {
    Changed {
        session: Option<AuthSession>,
        respond_to: oneshot::Sender<AuthState>,
    },
}

/// Server half: owns the mailbox and the publishing side of the state channel.
pub struct IdentityResolver {
    receiver: mpsc::Receiver<SessionEvent>,
    users: UserClient,
    state: watch::Sender<AuthState>,
}

/// Creates the resolver and its handle. The state starts as [`AuthState::Resolving`].
pub fn new(buffer_size: usize, users: UserClient) -> (IdentityResolver, IdentityHandle) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (state, watcher) = watch::channel(AuthState::Resolving);
    let resolver = IdentityResolver {
        receiver,
        users: users.clone(),
        state,
    };
    let handle = IdentityHandle {
        sender,
        state: watcher,
        users,
    };
    (resolver, handle)
}

impl IdentityResolver {
    pub async fn run(mut self) {
        info!("Identity resolver started");
        while let Some(event) = self.receiver.recv().await {
            match event {
                SessionEvent::Changed {
                    session,
                    respond_to,
                } => {
                    let resolved = self.resolve(session).await;
                    self.state.send_replace(resolved.clone());
                    let _ = respond_to.send(resolved);
                }
            }
        }
        info!("Identity resolver shutdown");
    }

    async fn resolve(&self, session: Option<AuthSession>) -> AuthState {
        let Some(session) = session else {
            info!("Signed out");
            return AuthState::SignedOut;
        };
        let uid = session.uid.clone();
        let role = match self.users.fetch_record(&uid).await {
            Ok(Some(record)) => {
                if record.role.is_none() {
                    warn!(%uid, "User record has no role");
                }
                record.role
            }
            Ok(None) => {
                warn!(%uid, "No user record, defaulting to customer");
                Some(Role::Customer)
            }
            Err(e) => {
                warn!(%uid, error = %e, "Role lookup failed, defaulting to customer");
                Some(Role::Customer)
            }
        };
        info!(%uid, role = ?role, "Signed in");
        AuthState::SignedIn(Identity::from_session(session, role))
    }
}

/// Client half. Cheap to clone; the resolver stops when every handle is dropped.
#[derive(Clone)]
pub struct IdentityHandle {
    sender: mpsc::Sender<SessionEvent>,
    state: watch::Receiver<AuthState>,
    users: UserClient,
}

impl IdentityHandle {
    /// Feeds one event from the identity provider and waits for its resolution.
    #[instrument(skip(self, session), fields(uid = ?session.as_ref().map(|s| &s.uid)))]
    pub async fn session_changed(
        &self,
        session: Option<AuthSession>,
    ) -> Result<AuthState, IdentityError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SessionEvent::Changed {
                session,
                respond_to,
            })
            .await
            .map_err(|_| IdentityError::ResolverClosed)?;
        response.await.map_err(|_| IdentityError::ResolverClosed)
    }

    pub async fn sign_in(&self, session: AuthSession) -> Result<AuthState, IdentityError> {
        self.session_changed(Some(session)).await
    }

    pub async fn sign_out(&self) -> Result<AuthState, IdentityError> {
        self.session_changed(None).await
    }

    /// Creates the user record with role `customer`, then signs the session in.
    #[instrument(skip(self, session), fields(uid = %session.uid))]
    pub async fn sign_up(&self, session: AuthSession) -> Result<AuthState, IdentityError> {
        let record = UserRecord::customer(session.uid.clone(), session.email.clone(), Utc::now());
        self.users.put_record(&record).await?;
        info!("User record created");
        self.sign_in(session).await
    }

    /// Promotes the user with this e-mail address to owner.
    ///
    /// Takes effect for that user at their next resolution.
    #[instrument(skip(self))]
    pub async fn grant_owner(&self, email: &str) -> Result<UserRecord, IdentityError> {
        let record = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(email.to_string()))?;
        let updated = self.users.set_role(&record.uid, Role::Owner).await?;
        info!(uid = %updated.uid, "Owner role granted");
        Ok(updated)
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// A receiver of every state change, starting from the current one.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Waits until the first resolution has completed.
    pub async fn wait_resolved(&self) -> Result<AuthState, IdentityError> {
        let mut state = self.state.clone();
        let resolved = state
            .wait_for(AuthState::is_resolved)
            .await
            .map_err(|_| IdentityError::ResolverClosed)?;
        Ok(resolved.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_actor::{self, Document};
    use crate::model::UserId;
    use collection_actor::mock::MockClient;
    use collection_actor::FrameworkError;
    use serde_json::json;

    fn start_with(users: UserClient) -> IdentityHandle {
        let (resolver, handle) = new(8, users);
        tokio::spawn(resolver.run());
        handle
    }

    fn start() -> (IdentityHandle, UserClient) {
        let (actor, users) = document_actor::users_collection(8);
        tokio::spawn(actor.run(()));
        (start_with(users.clone()), users)
    }

    #[tokio::test]
    async fn test_starts_resolving_then_signs_out() {
        let (identity, _) = start();
        assert_eq!(identity.current(), AuthState::Resolving);

        let state = identity.sign_out().await.unwrap();
        assert_eq!(state, AuthState::SignedOut);
        assert_eq!(identity.wait_resolved().await.unwrap(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_role_comes_from_user_record() {
        let (identity, users) = start();
        let mut record = UserRecord::customer(UserId::new("boss"), "boss@shop.test", Utc::now());
        record.role = Some(Role::Owner);
        users.put_record(&record).await.unwrap();

        let state = identity
            .sign_in(AuthSession::new("boss", "boss@shop.test"))
            .await
            .unwrap();
        assert_eq!(state.role(), Some(Role::Owner));
    }

    #[tokio::test]
    async fn test_missing_record_falls_back_to_customer() {
        let (identity, _) = start();
        let state = identity
            .sign_in(AuthSession::new("new", "new@shop.test"))
            .await
            .unwrap();
        assert_eq!(state.role(), Some(Role::Customer));
    }

    #[tokio::test]
    async fn test_malformed_record_falls_back_to_customer() {
        let (identity, users) = start();
        let mut fields = serde_json::Map::new();
        fields.insert("uid".into(), json!("odd"));
        fields.insert("email".into(), json!("odd@shop.test"));
        fields.insert("role".into(), json!("superuser"));
        collection_actor::ActorClient::inner(&users)
            .put("odd".into(), fields)
            .await
            .unwrap();

        let state = identity
            .sign_in(AuthSession::new("odd", "odd@shop.test"))
            .await
            .unwrap();
        assert_eq!(state.role(), Some(Role::Customer));
    }

    #[tokio::test]
    async fn test_unreachable_user_store_falls_back_to_customer() {
        let mut mock = MockClient::<Document>::new();
        mock.expect_get("u1".to_string())
            .return_err(FrameworkError::ActorClosed);
        let identity = start_with(UserClient::new(mock.client()));

        let state = identity
            .sign_in(AuthSession::new("u1", "u1@shop.test"))
            .await
            .unwrap();
        assert_eq!(state.role(), Some(Role::Customer));
        mock.verify();
    }

    #[tokio::test]
    async fn test_sign_up_writes_customer_record() {
        let (identity, users) = start();
        let state = identity
            .sign_up(AuthSession::new("u9", "nine@shop.test").with_display_name("Nine"))
            .await
            .unwrap();

        assert_eq!(state.identity().unwrap().customer_name(), "Nine");
        let record = users.fetch_record(&UserId::new("u9")).await.unwrap().unwrap();
        assert_eq!(record.role, Some(Role::Customer));
        assert!(record.created_at.is_some());
    }

    #[tokio::test]
    async fn test_grant_owner_applies_on_next_resolution() {
        let (identity, _) = start();
        let session = AuthSession::new("u1", "ann@shop.test");
        identity.sign_up(session.clone()).await.unwrap();

        let granted = identity.grant_owner("ANN@shop.test").await.unwrap();
        assert_eq!(granted.role, Some(Role::Owner));
        assert_eq!(identity.current().role(), Some(Role::Customer));

        let refreshed = identity.sign_in(session).await.unwrap();
        assert_eq!(refreshed.role(), Some(Role::Owner));

        let unknown = identity.grant_owner("nobody@shop.test").await;
        assert_eq!(
            unknown,
            Err(IdentityError::UserNotFound("nobody@shop.test".into()))
        );
    }

    #[tokio::test]
    async fn test_watchers_observe_the_latest_resolution() {
        let (identity, _) = start();
        let mut watcher = identity.watch();

        identity
            .sign_in(AuthSession::new("a", "a@shop.test"))
            .await
            .unwrap();
        identity.sign_out().await.unwrap();

        watcher.changed().await.unwrap();
        assert_eq!(*watcher.borrow_and_update(), AuthState::SignedOut);
    }
}
