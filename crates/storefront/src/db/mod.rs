//! Database operations for the storefront `SQLite` database.
//!
//! # Tables
//!
//! - `product` - Catalog rows (read-only to the cart/order core; seeded via
//!   `reign-cli seed`)
//! - `cart` - One row per customer identity, bumped on every mutation
//! - `cart_item` - Cart lines, unique per (identity, product)
//! - `orders` - Immutable order snapshots plus their mutable status
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded via
//! [`MIGRATOR`]. They run on server startup and via:
//! ```bash
//! cargo run -p reign-cli -- migrate
//! ```
//!
//! Monetary columns are decimal TEXT parsed with `rust_decimal`; a value that
//! fails to parse is surfaced as [`RepositoryError::DataCorruption`].

pub mod carts;
pub mod orders;
pub mod products;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Embedded migrations from `crates/storefront/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors from the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The addressed row does not exist.
    #[error("not found")]
    NotFound,

    /// The row was modified concurrently.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if missing. In-memory databases get a
/// single-connection pool, since every pooled connection would otherwise see
/// its own empty database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{MIGRATOR, create_pool};
    use secrecy::SecretString;
    use sqlx::SqlitePool;

    /// Fresh in-memory database with migrations applied.
    pub async fn memory_pool() -> SqlitePool {
        let pool = create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .expect("in-memory pool");
        MIGRATOR.run(&pool).await.expect("migrations");
        pool
    }
}
