use super::identity::Role;
use super::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document in the `users` collection, keyed by the identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: UserId,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Record written at sign-up.
    pub fn customer(uid: UserId, email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            uid,
            email: email.into(),
            role: Some(Role::Customer),
            created_at: Some(created_at),
        }
    }
}
