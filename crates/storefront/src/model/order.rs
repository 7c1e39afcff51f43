//! Orders and their status machine.

use super::cart::CartItem;
use super::identity::Identity;
use super::ids::{OrderId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fulfilment status of an order.
///
/// `pending → {processing, cancelled}`, `processing → {shipped, cancelled}`,
/// `shipped → {delivered, cancelled}`. Delivered and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn next_allowed(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_allowed().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.next_allowed().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

pub const ADDRESS_NOT_PROVIDED: &str = "Not provided";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub country: String,
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            address: ADDRESS_NOT_PROVIDED.to_string(),
            city: ADDRESS_NOT_PROVIDED.to_string(),
            country: ADDRESS_NOT_PROVIDED.to_string(),
        }
    }
}

/// A placed order. Only `status` and `updated_at` change after creation.
///
/// The id lives in the document key, not in the stored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip)]
    pub id: OrderId,
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds a pending order from a cart's lines. The total is computed here, once.
    pub fn pending(customer: &Identity, items: Vec<CartItem>, created_at: DateTime<Utc>) -> Self {
        let total_amount = items.iter().map(CartItem::line_total).sum();
        Self {
            id: OrderId::default(),
            customer_id: customer.id.clone(),
            customer_name: customer.customer_name(),
            customer_email: customer.email.clone(),
            items,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address: ShippingAddress::default(),
            created_at,
            updated_at: None,
        }
    }

    /// Checks what serde cannot: non-empty lines, positive quantities, non-negative amounts.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("order has no items".to_string());
        }
        if let Some(item) = self.items.iter().find(|item| !item.is_valid()) {
            return Err(format!("invalid line for product {}", item.product_id));
        }
        if self.total_amount < Decimal::ZERO {
            return Err("negative total".to_string());
        }
        Ok(())
    }
}
