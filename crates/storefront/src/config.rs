//! Runtime configuration, read from the environment (and a `.env` file when present).
//!
//! | Variable                        | Default      |
//! |---------------------------------|--------------|
//! | `STOREFRONT_CART_DIR`           | in-memory    |
//! | `STOREFRONT_MAILBOX_CAPACITY`   | `32`         |
//! | `STOREFRONT_STRICT_TRANSITIONS` | `false`      |
//! | `STOREFRONT_NOTICE_CAPACITY`    | `64`         |

use crate::order_manager::TransitionPolicy;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub const CART_DIR: &str = "STOREFRONT_CART_DIR";
pub const MAILBOX_CAPACITY: &str = "STOREFRONT_MAILBOX_CAPACITY";
pub const STRICT_TRANSITIONS: &str = "STOREFRONT_STRICT_TRANSITIONS";
pub const NOTICE_CAPACITY: &str = "STOREFRONT_NOTICE_CAPACITY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidEnvVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Directory for cart slots. `None` keeps carts in memory.
    pub cart_dir: Option<PathBuf>,
    /// Buffer size of every actor mailbox.
    pub mailbox_capacity: usize,
    pub transition_policy: TransitionPolicy,
    pub notice_capacity: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            cart_dir: None,
            mailbox_capacity: 32,
            transition_policy: TransitionPolicy::Permissive,
            notice_capacity: 64,
        }
    }
}

impl StorefrontConfig {
    /// Loads `.env` if there is one, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source. Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(CART_DIR) {
            config.cart_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(value) = get(MAILBOX_CAPACITY) {
            config.mailbox_capacity = parse_capacity(MAILBOX_CAPACITY, &value)?;
        }
        if let Some(value) = get(NOTICE_CAPACITY) {
            config.notice_capacity = parse_capacity(NOTICE_CAPACITY, &value)?;
        }
        if let Some(value) = get(STRICT_TRANSITIONS) {
            config.transition_policy = if parse_flag(STRICT_TRANSITIONS, &value)? {
                TransitionPolicy::Strict
            } else {
                TransitionPolicy::Permissive
            };
        }
        Ok(config)
    }
}

fn parse_capacity(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid(name, value, "must be at least 1")),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(invalid(name, value, &e.to_string())),
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "expected a boolean")),
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorefrontConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(load(&[]).unwrap(), StorefrontConfig::default());
        assert_eq!(load(&[(CART_DIR, "  ")]).unwrap().cart_dir, None);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = load(&[
            (CART_DIR, "/var/lib/storefront/carts"),
            (MAILBOX_CAPACITY, "8"),
            (STRICT_TRANSITIONS, "Yes"),
            (NOTICE_CAPACITY, "4"),
        ])
        .unwrap();
        assert_eq!(config.cart_dir, Some(PathBuf::from("/var/lib/storefront/carts")));
        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.notice_capacity, 4);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            load(&[(MAILBOX_CAPACITY, "0")]),
            Err(ConfigError::InvalidEnvVar { name: MAILBOX_CAPACITY, .. })
        ));
        assert!(load(&[(MAILBOX_CAPACITY, "many")]).is_err());
        assert!(load(&[(STRICT_TRANSITIONS, "maybe")]).is_err());
    }
}
