//! Core types for the Reign Co storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod geo;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use geo::{Coordinates, RegionBounds};
pub use id::*;
pub use money::{Money, MoneyError};
pub use status::{OrderStatus, PaymentMethod, StatusParseError};
