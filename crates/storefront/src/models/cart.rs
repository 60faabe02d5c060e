//! Cart models.
//!
//! A stored [`CartItem`] is a product reference plus a quantity; the
//! [`CartView`] returned to clients joins those rows against the catalog at
//! its *current* values. Nothing in the cart is frozen - freezing happens
//! only when an order is created.

use serde::{Deserialize, Serialize};

use reign_core::{Money, ProductId};

/// A stored cart row. Quantity is always >= 1; a row that would drop below
/// one is deleted instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart item hydrated against the catalog for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartViewItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: String,
    pub quantity: u32,
    pub line_total: Money,
}

/// Cart contents as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CartView {
    pub items: Vec<CartViewItem>,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Sum of line totals at current catalog prices (display only).
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|item| item.line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal_sums_line_totals() {
        let view = CartView {
            items: vec![
                CartViewItem {
                    product_id: ProductId::new(1),
                    name: "Amber candle".into(),
                    price: "35".parse().unwrap(),
                    image: "/uploads/amber.webp".into(),
                    quantity: 2,
                    line_total: "70".parse().unwrap(),
                },
                CartViewItem {
                    product_id: ProductId::new(2),
                    name: "Oud candle".into(),
                    price: "50".parse().unwrap(),
                    image: "/uploads/oud.webp".into(),
                    quantity: 1,
                    line_total: "50".parse().unwrap(),
                },
            ],
        };
        assert_eq!(view.subtotal(), "120".parse().unwrap());
        assert_eq!(CartView::empty().subtotal(), Money::ZERO);
    }
}
