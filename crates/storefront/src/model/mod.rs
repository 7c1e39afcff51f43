//! Domain types shared by every component.

pub mod cart;
pub mod identity;
pub mod ids;
pub mod order;
pub mod user;

pub use cart::{CartItem, CartSnapshot, PartitionKey, Product};
pub use identity::{AuthSession, AuthState, Identity, Role};
pub use ids::{OrderId, ProductId, UserId};
pub use order::{Order, OrderStatus, ShippingAddress};
pub use user::UserRecord;
