//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::{CheckoutConfig, StorefrontConfig};
use crate::services::{GeocodingClient, GeocodingError};

/// Application state shared across request handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    geocoder: GeocodingClient,
}

impl AppState {
    /// Build the shared state from configuration and a connected pool.
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError` if the geocoding HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Result<Self, GeocodingError> {
        let geocoder = GeocodingClient::new(&config.geocoding)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                geocoder,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutConfig {
        &self.inner.config.checkout
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn geocoder(&self) -> &GeocodingClient {
        &self.inner.geocoder
    }
}
