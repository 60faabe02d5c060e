//! Reverse-geocoding client for a Nominatim-compatible API.
//!
//! Used at checkout to turn delivery coordinates into a human-readable
//! address for the order record. Lookups are cached; customers adjusting a
//! map pin tend to hit the same spot repeatedly.

use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;

use reign_core::Coordinates;

use crate::config::GeocodingConfig;

/// Cache entries expire after this long.
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Maximum number of cached lookups.
const CACHE_CAPACITY: u64 = 1_000;

/// Errors from the reverse-geocoding gateway.
#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoding API returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
    },
    #[error("unexpected geocoding response: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Reverse-geocoding client with an in-memory lookup cache.
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
    // Keyed on coordinates quantized to ~1 metre.
    cache: Cache<(i64, i64), String>,
}

impl GeocodingClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reign-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        })
    }

    /// Resolve coordinates to a display address.
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError` if the request fails, the API answers with a
    /// non-success status, or the response carries no address.
    pub async fn reverse(&self, point: Coordinates) -> Result<String, GeocodingError> {
        let key = cache_key(point);
        if let Some(address) = self.cache.get(&key).await {
            return Ok(address);
        }

        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ReverseResponse = response.json().await?;
        let address = body
            .display_name
            .ok_or_else(|| GeocodingError::Parse("response has no display_name".into()))?;

        self.cache.insert(key, address.clone()).await;
        Ok(address)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cache_key(point: Coordinates) -> (i64, i64) {
    ((point.lat * 1e5).round() as i64, (point.lng * 1e5).round() as i64)
}
