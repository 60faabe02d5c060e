//! Catalog product model.
//!
//! The catalog is read-only from the cart/order core's perspective: products
//! are referenced by id and may disappear independently of the carts and
//! orders that mention them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reign_core::{Money, ProductId};

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Current catalog price. Orders freeze their own copy at creation.
    pub price: Money,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
