//! Clients for external services.

pub mod geocoding;

pub use geocoding::{GeocodingClient, GeocodingError};
