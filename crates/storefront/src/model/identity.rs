//! Who is browsing: roles, resolved identities and the session state published to consumers.

use super::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role stored on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
    Owner,
}

impl Role {
    /// Admin and owner manage orders with the same privileges.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A raw session as reported by the external identity provider, before any role lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthSession {
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A resolved identity. `role == None` means the user record carried no role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

impl Identity {
    pub fn from_session(session: AuthSession, role: Option<Role>) -> Self {
        Self {
            id: session.uid,
            email: session.email,
            display_name: session.display_name,
            role,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    /// Name shown on orders: the display name, else the local part of the e-mail address.
    pub fn customer_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .unwrap_or("Customer")
                .to_string(),
        }
    }
}

/// Current session state, as every consumer observes it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// The first resolution has not completed yet.
    #[default]
    Resolving,
    SignedOut,
    SignedIn(Identity),
}

impl AuthState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Resolving)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    /// Role of an authenticated identity; `None` when signed out, resolving or role-less.
    pub fn role(&self) -> Option<Role> {
        self.identity().and_then(|identity| identity.role)
    }
}
