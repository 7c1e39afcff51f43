//! Cart contents and the partition key that says whose cart they are.

use super::identity::AuthState;
use super::ids::{ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A product as offered by the catalogue, the input to `add_item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image_url: None,
            description: None,
        }
    }
}

/// Largest quantity a single cart line can hold. Larger requests are capped to it.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// One line of a cart. Also the line format frozen into orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CartItem {
    pub fn from_product(product: Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name,
            price: product.price,
            quantity: 1,
            image_url: product.image_url,
            description: product.description,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// A stored line is usable only with a quantity in `1..=MAX_LINE_QUANTITY` and a
    /// non-negative price.
    pub fn is_valid(&self) -> bool {
        (1..=MAX_LINE_QUANTITY).contains(&self.quantity) && self.price >= Decimal::ZERO
    }
}

/// Selects which stored cart belongs to which identity: `cart_<uid>` or `cart_guest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn guest() -> Self {
        Self("cart_guest".to_string())
    }

    pub fn for_user(uid: &UserId) -> Self {
        Self(format!("cart_{uid}"))
    }

    /// The partition a session state selects. `None` while identity is still resolving.
    pub fn for_auth(state: &AuthState) -> Option<Self> {
        match state {
            AuthState::Resolving => None,
            AuthState::SignedOut => Some(Self::guest()),
            AuthState::SignedIn(identity) => Some(Self::for_user(&identity.id)),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.0 == "cart_guest"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable copy of the active cart at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub key: PartitionKey,
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn empty(key: PartitionKey) -> Self {
        Self {
            key,
            items: Vec::new(),
        }
    }

    /// Σ price × quantity over the current lines.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Σ quantity over the current lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::identity::{Identity, Role};

    fn line(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            quantity,
            ..CartItem::from_product(Product::new(id, id, Decimal::from(price)))
        }
    }

    #[test]
    fn test_total_and_count() {
        let snapshot = CartSnapshot {
            key: PartitionKey::guest(),
            items: vec![line("a", 10, 2), line("b", 5, 3)],
        };
        assert_eq!(snapshot.total(), Decimal::from(35));
        assert_eq!(snapshot.item_count(), 5);
    }

    #[test]
    fn test_total_keeps_cents_exact() {
        let item = CartItem {
            quantity: 3,
            ..CartItem::from_product(Product::new("p", "Pen", Decimal::new(1999, 2)))
        };
        assert_eq!(item.line_total(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_partition_keys() {
        assert_eq!(PartitionKey::guest().as_str(), "cart_guest");
        assert_eq!(PartitionKey::for_user(&UserId::new("abc")).as_str(), "cart_abc");

        let signed_in = AuthState::SignedIn(Identity {
            id: UserId::new("abc"),
            email: "a@b.c".into(),
            display_name: None,
            role: Some(Role::Customer),
        });
        assert_eq!(
            PartitionKey::for_auth(&signed_in),
            Some(PartitionKey::for_user(&UserId::new("abc")))
        );
        assert_eq!(
            PartitionKey::for_auth(&AuthState::SignedOut),
            Some(PartitionKey::guest())
        );
        assert_eq!(PartitionKey::for_auth(&AuthState::Resolving), None);
    }

    #[test]
    fn test_cart_item_wire_format_is_camel_case() {
        let json = serde_json::to_value(line("p1", 10, 2)).unwrap();
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["quantity"], 2);
        assert!(json.get("imageUrl").is_none());
    }
}
