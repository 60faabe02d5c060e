//! Reign Co storefront library.
//!
//! Cart, checkout pricing, and order lifecycle for the Reign Co candle
//! shop, exposed as a library so the CLI and the integration tests can
//! drive it without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod services;
pub mod state;
