//! Order models.
//!
//! An [`Order`] is an immutable snapshot: line items carry the product name
//! and price as they were at creation time, and the totals are computed once
//! and never recomputed. Only `status` changes after creation, and only along
//! the transitions defined on [`OrderStatus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reign_core::{Coordinates, Money, OrderId, OrderStatus, PaymentMethod, ProductId};

/// A line item frozen at order-creation time.
///
/// Distinct from a cart item on purpose: the cart row is a mutable product
/// *reference*, this is an immutable *value* that survives catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderLineItem {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// A persisted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub contact: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meetup_location_id: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to persist a new order. Built by the checkout route
/// after pricing; the repository assigns the id, status, and timestamp.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub contact: String,
    pub payment_method: PaymentMethod,
    pub delivery_coordinates: Option<Coordinates>,
    pub delivery_address: Option<String>,
    pub meetup_location_id: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}
