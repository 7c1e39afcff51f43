//! Declarative route requirements.

use crate::model::Role;
use std::collections::HashMap;

/// What a route asks of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRequirement {
    Public,
    SignedIn,
    /// Signed in with one of these roles.
    Roles(Vec<Role>),
}

impl RouteRequirement {
    /// The role list handed to [`decide`](super::decide). `None` for public routes.
    pub fn required_roles(&self) -> Option<&[Role]> {
        match self {
            RouteRequirement::Public => None,
            RouteRequirement::SignedIn => Some(&[]),
            RouteRequirement::Roles(roles) => Some(roles),
        }
    }
}

/// Route path → requirement. Routes missing from the table are public.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteRequirement>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: impl Into<String>, requirement: RouteRequirement) -> Self {
        self.routes.insert(normalize(&path.into()), requirement);
        self
    }

    /// The storefront's routes. Admin and owner share order management.
    pub fn storefront_default() -> Self {
        use RouteRequirement::*;
        Self::new()
            .route("/", Public)
            .route("/login", Public)
            .route("/signup", Public)
            .route("/forgot-password", Public)
            .route("/products", Public)
            .route("/cart", SignedIn)
            .route("/checkout", SignedIn)
            .route("/chat", SignedIn)
            .route("/admin/setup", SignedIn)
            .route("/owner/dashboard", Roles(vec![Role::Owner]))
            .route("/admin/orders", Roles(vec![Role::Admin, Role::Owner]))
    }

    pub fn requirement(&self, path: &str) -> &RouteRequirement {
        self.routes
            .get(&normalize(path))
            .unwrap_or(&RouteRequirement::Public)
    }
}

/// `/cart/` and `/cart?x=1` are `/cart`.
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = RouteTable::storefront_default();
        assert_eq!(table.requirement("/"), &RouteRequirement::Public);
        assert_eq!(table.requirement("/checkout"), &RouteRequirement::SignedIn);
        assert_eq!(
            table.requirement("/admin/orders"),
            &RouteRequirement::Roles(vec![Role::Admin, Role::Owner])
        );
        assert_eq!(table.requirement("/no/such/page"), &RouteRequirement::Public);
    }

    #[test]
    fn test_paths_are_normalized() {
        let table = RouteTable::storefront_default();
        assert_eq!(table.requirement("/cart/"), &RouteRequirement::SignedIn);
        assert_eq!(table.requirement("/cart?step=2"), &RouteRequirement::SignedIn);
        assert_eq!(table.requirement(""), &RouteRequirement::Public);
    }
}
