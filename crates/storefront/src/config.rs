//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `DELIVERY_BASE_FARE` - Flat fare added to every delivery (default: 10)
//! - `DELIVERY_PER_KM_RATE` - Fare per kilometre (default: 2.5)
//! - `DELIVERY_MINIMUM_FEE` - Floor applied after rounding (default: 15)
//! - `DELIVERY_FEE_INCREMENT` - Rounding increment for fees (default: 0.5)
//! - `SELLER_LAT` / `SELLER_LNG` - Where deliveries are dispatched from
//! - `SERVICE_REGION_MIN_LAT` / `SERVICE_REGION_MAX_LAT` /
//!   `SERVICE_REGION_MIN_LNG` / `SERVICE_REGION_MAX_LNG` - Delivery bounding box
//! - `MEETUP_LOCATIONS` - JSON array of meetup pickup points
//! - `GEOCODING_BASE_URL` - Nominatim-compatible endpoint
//! - `GEOCODING_TIMEOUT_SECS` - Reverse-geocode timeout (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! The delivery-fee constants have been retuned several times in the shop's
//! history, which is why they are configuration rather than literals in the
//! pricing code.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use reign_core::{Coordinates, Money, RegionBounds};

/// Default meetup pickup points around Doha.
const DEFAULT_MEETUP_LOCATIONS: &str = r#"[
  {"id": "souq-waqif", "name": "Souq Waqif main gate", "coordinates": {"lat": 25.2867, "lng": 51.5333}},
  {"id": "katara", "name": "Katara Cultural Village", "coordinates": {"lat": 25.3594, "lng": 51.5260}},
  {"id": "villaggio", "name": "Villaggio Mall entrance", "coordinates": {"lat": 25.2610, "lng": 51.4416}}
]"#;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Everything checkout pricing needs
    pub checkout: CheckoutConfig,
    /// Reverse-geocoding gateway configuration
    pub geocoding: GeocodingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Pricing constants, seller origin, service region, and meetup points.
///
/// Injected into the pricing engine and order creation so tests can
/// substitute deterministic values.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Delivery-fee formula constants
    pub pricing: PricingConfig,
    /// Where deliveries are dispatched from
    pub seller: Coordinates,
    /// Rectangular delivery service region
    pub region: RegionBounds,
    /// Fixed list of meetup pickup points
    pub meetup_locations: Vec<MeetupLocation>,
}

impl CheckoutConfig {
    /// Look up a meetup location by its id.
    #[must_use]
    pub fn meetup_location(&self, id: &str) -> Option<&MeetupLocation> {
        self.meetup_locations.iter().find(|loc| loc.id == id)
    }
}

/// Constants of the delivery-fee formula.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    /// Flat fare added to every delivery.
    pub base_fare: Money,
    /// Fare per kilometre of great-circle distance.
    pub per_km_rate: Money,
    /// Floor applied after rounding.
    pub minimum_fee: Money,
    /// Fees are rounded to a multiple of this increment.
    pub rounding_increment: Money,
}

/// A fixed meetup pickup point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetupLocation {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
}

/// Reverse-geocoding gateway configuration.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    /// Nominatim-compatible endpoint base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_parsed::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_env_parsed::<u16>("STOREFRONT_PORT", "3000")?;

        let checkout = CheckoutConfig::from_env()?;
        let geocoding = GeocodingConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            checkout,
            geocoding,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let pricing = PricingConfig {
            base_fare: get_env_parsed::<Money>("DELIVERY_BASE_FARE", "10")?,
            per_km_rate: get_env_parsed::<Money>("DELIVERY_PER_KM_RATE", "2.5")?,
            minimum_fee: get_env_parsed::<Money>("DELIVERY_MINIMUM_FEE", "15")?,
            rounding_increment: get_env_parsed::<Money>("DELIVERY_FEE_INCREMENT", "0.5")?,
        };

        let seller = Coordinates::new(
            get_env_parsed::<f64>("SELLER_LAT", "25.2854")?,
            get_env_parsed::<f64>("SELLER_LNG", "51.5310")?,
        );

        let region = RegionBounds {
            min_lat: get_env_parsed::<f64>("SERVICE_REGION_MIN_LAT", "24.4")?,
            max_lat: get_env_parsed::<f64>("SERVICE_REGION_MAX_LAT", "26.2")?,
            min_lng: get_env_parsed::<f64>("SERVICE_REGION_MIN_LNG", "50.7")?,
            max_lng: get_env_parsed::<f64>("SERVICE_REGION_MAX_LNG", "51.7")?,
        };

        let meetup_json =
            std::env::var("MEETUP_LOCATIONS").unwrap_or_else(|_| DEFAULT_MEETUP_LOCATIONS.into());
        let meetup_locations: Vec<MeetupLocation> = serde_json::from_str(&meetup_json)
            .map_err(|e| ConfigError::InvalidEnvVar("MEETUP_LOCATIONS".into(), e.to_string()))?;

        Ok(Self {
            pricing,
            seller,
            region,
            meetup_locations,
        })
    }
}

impl GeocodingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_env_or_default("GEOCODING_BASE_URL", "https://nominatim.openstreetmap.org"),
            timeout: Duration::from_secs(get_env_parsed::<u64>("GEOCODING_TIMEOUT_SECS", "5")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable (with default) parsed into `T`.
fn get_env_parsed<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
