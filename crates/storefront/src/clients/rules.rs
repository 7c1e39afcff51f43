//! Access rules of the remote `orders` collection.
//!
//! The rules run in the client, before a write is sent to the collection actor, so a rejected
//! write never reaches the store. Any signed-in user with a role may create an order; only admin
//! and owner may change or delete one.

use crate::model::{Identity, Role};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Access::Read => "read",
            Access::Create => "create",
            Access::Update => "update",
            Access::Delete => "delete",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{access} on orders denied for {caller}")]
pub struct RuleViolation {
    pub access: Access,
    pub caller: String,
}

pub fn check_order_access(access: Access, caller: Option<&Identity>) -> Result<(), RuleViolation> {
    let role = caller.and_then(|identity| identity.role);
    let allowed = match access {
        Access::Read => true,
        Access::Create => role.is_some(),
        Access::Update | Access::Delete => role.is_some_and(Role::is_staff),
    };
    if allowed {
        Ok(())
    } else {
        Err(RuleViolation {
            access,
            caller: role.map_or_else(|| "anonymous".to_string(), |role| role.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn caller(role: Option<Role>) -> Identity {
        Identity {
            id: UserId::new("u1"),
            email: "u1@shop.test".into(),
            display_name: None,
            role,
        }
    }

    #[test]
    fn test_customers_create_but_never_mutate() {
        let customer = caller(Some(Role::Customer));
        assert!(check_order_access(Access::Create, Some(&customer)).is_ok());
        assert!(check_order_access(Access::Update, Some(&customer)).is_err());
        assert!(check_order_access(Access::Delete, Some(&customer)).is_err());
    }

    #[test]
    fn test_staff_may_mutate() {
        for role in [Role::Admin, Role::Owner] {
            let staff = caller(Some(role));
            assert!(check_order_access(Access::Update, Some(&staff)).is_ok());
            assert!(check_order_access(Access::Delete, Some(&staff)).is_ok());
        }
    }

    #[test]
    fn test_anonymous_and_role_less_callers_only_read() {
        let role_less = caller(None);
        assert!(check_order_access(Access::Read, None).is_ok());
        let denied = check_order_access(Access::Create, None).unwrap_err();
        assert_eq!(denied.caller, "anonymous");
        assert!(check_order_access(Access::Create, Some(&role_less)).is_err());
    }
}
