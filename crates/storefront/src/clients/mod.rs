//! Typed clients for the remote collections.

pub mod order_client;
pub mod rules;
pub mod user_client;

pub use order_client::{decode_order, orders_from_snapshot, OrderClient};
pub use user_client::UserClient;
