//! Domain models for the storefront.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartItem, CartView, CartViewItem};
pub use order::{NewOrder, Order, OrderLineItem};
pub use product::Product;
