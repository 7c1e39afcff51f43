//! # Access Gate
//!
//! Decides whether a view is reachable for the current session.
//!
//! The gate reads the identity resolver's [`AuthState`] and never changes it. While the first
//! resolution is still running every protected route answers [`GateDecision::Pending`], so no
//! protected view is rendered on a guess.
//!
//! Requirements live in one [`RouteTable`]; admin and owner share order management because the
//! table says so, not because of a special case here.

pub mod routes;

pub use routes::{RouteRequirement, RouteTable};

use crate::model::{AuthState, Role};
use crate::notice::Notifier;
use tokio::sync::watch;
use tracing::debug;

pub const UNAUTHORIZED_NOTICE: &str = "You are not authorized to view this page.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Identity is still resolving; show a placeholder.
    Pending,
    Allow,
    /// Send the visitor to the login view, remembering where they were going.
    RedirectToLogin { from: String },
    /// Signed in without a suitable role.
    RedirectHome,
}

/// The decision for a protected route. An empty `required_roles` admits any signed-in role.
pub fn decide(state: &AuthState, route: &str, required_roles: &[Role]) -> GateDecision {
    match state {
        AuthState::Resolving => GateDecision::Pending,
        AuthState::SignedOut => GateDecision::RedirectToLogin {
            from: route.to_string(),
        },
        AuthState::SignedIn(identity) => match identity.role {
            None => GateDecision::RedirectToLogin {
                from: route.to_string(),
            },
            Some(_) if required_roles.is_empty() => GateDecision::Allow,
            Some(role) if required_roles.contains(&role) => GateDecision::Allow,
            Some(_) => GateDecision::RedirectHome,
        },
    }
}

#[derive(Clone)]
pub struct AccessGate {
    auth: watch::Receiver<AuthState>,
    routes: RouteTable,
    notifier: Notifier,
}

impl AccessGate {
    pub fn new(auth: watch::Receiver<AuthState>, routes: RouteTable, notifier: Notifier) -> Self {
        Self {
            auth,
            routes,
            notifier,
        }
    }

    /// Decides against the current state. A denial raises the unauthorized notice.
    pub fn can_enter(&self, route: &str, required_roles: &[Role]) -> GateDecision {
        let decision = decide(&self.auth.borrow(), route, required_roles);
        debug!(route, ?decision, "Gate decision");
        if decision == GateDecision::RedirectHome {
            self.notifier.error(UNAUTHORIZED_NOTICE);
        }
        decision
    }

    /// Decides using the route table.
    pub fn enter(&self, route: &str) -> GateDecision {
        match self.routes.requirement(route).required_roles() {
            None => GateDecision::Allow,
            Some(roles) => self.can_enter(route, roles),
        }
    }

    /// Like [`enter`](Self::enter), but waits out the first resolution instead of answering
    /// `Pending`.
    pub async fn enter_when_ready(&self, route: &str) -> GateDecision {
        let mut auth = self.auth.clone();
        if auth.wait_for(AuthState::is_resolved).await.is_err() {
            debug!(route, "Identity resolver gone before resolving");
        }
        self.enter(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, UserId};
    use crate::notice::NoticeLevel;
    use std::time::Duration;

    fn signed_in(role: Option<Role>) -> AuthState {
        AuthState::SignedIn(Identity {
            id: UserId::new("u1"),
            email: "u1@shop.test".into(),
            display_name: None,
            role,
        })
    }

    fn gate() -> (AccessGate, watch::Sender<AuthState>, Notifier) {
        let (auth, watcher) = watch::channel(AuthState::Resolving);
        let notifier = Notifier::new(8);
        let gate = AccessGate::new(watcher, RouteTable::storefront_default(), notifier.clone());
        (gate, auth, notifier)
    }

    #[test]
    fn test_decide_table() {
        let staff = [Role::Admin, Role::Owner];
        assert_eq!(decide(&AuthState::Resolving, "/x", &staff), GateDecision::Pending);
        assert_eq!(
            decide(&AuthState::SignedOut, "/x", &staff),
            GateDecision::RedirectToLogin { from: "/x".into() }
        );
        assert_eq!(
            decide(&signed_in(None), "/x", &[]),
            GateDecision::RedirectToLogin { from: "/x".into() }
        );
        assert_eq!(decide(&signed_in(Some(Role::Customer)), "/x", &[]), GateDecision::Allow);
        assert_eq!(
            decide(&signed_in(Some(Role::Customer)), "/x", &staff),
            GateDecision::RedirectHome
        );
        assert_eq!(decide(&signed_in(Some(Role::Admin)), "/x", &staff), GateDecision::Allow);
        assert_eq!(decide(&signed_in(Some(Role::Owner)), "/x", &staff), GateDecision::Allow);
    }

    #[tokio::test]
    async fn test_pending_then_redirect_home_then_allow() {
        let (gate, auth, notifier) = gate();
        let mut notices = notifier.subscribe();

        assert_eq!(gate.enter("/owner/dashboard"), GateDecision::Pending);

        auth.send_replace(signed_in(Some(Role::Customer)));
        assert_eq!(gate.enter("/owner/dashboard"), GateDecision::RedirectHome);
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, UNAUTHORIZED_NOTICE);

        auth.send_replace(signed_in(Some(Role::Owner)));
        assert_eq!(gate.enter("/owner/dashboard"), GateDecision::Allow);
    }

    #[tokio::test]
    async fn test_public_routes_never_wait() {
        let (gate, _auth, _) = gate();
        assert_eq!(gate.enter("/products"), GateDecision::Allow);
        assert_eq!(gate.enter("/somewhere/new"), GateDecision::Allow);
    }

    #[tokio::test]
    async fn test_enter_when_ready_waits_for_resolution() {
        let (gate, auth, _) = gate();
        let waiting = tokio::spawn({
            let gate = gate.clone();
            async move { gate.enter_when_ready("/checkout").await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiting.is_finished());
        auth.send_replace(AuthState::SignedOut);

        assert_eq!(
            waiting.await.unwrap(),
            GateDecision::RedirectToLogin {
                from: "/checkout".into()
            }
        );
    }

    #[tokio::test]
    async fn test_admin_and_owner_share_order_management() {
        let (gate, auth, _) = gate();
        auth.send_replace(signed_in(Some(Role::Admin)));
        assert_eq!(gate.enter("/admin/orders"), GateDecision::Allow);
        assert_eq!(gate.enter("/owner/dashboard"), GateDecision::RedirectHome);
    }
}
