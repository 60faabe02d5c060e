//! Seed the catalog with demo products.
//!
//! Inserts the standard Reign Co candle range so a fresh database has
//! something to sell. Re-running adds duplicates; intended for fresh
//! development databases only.

use tracing::info;

use reign_core::Money;
use reign_storefront::db::{self, ProductRepository};

use super::CommandError;

const DEMO_PRODUCTS: &[(&str, &str, &str, &str)] = &[
    (
        "Amber candle",
        "35",
        "/uploads/amber.webp",
        "Warm amber and vanilla, 220g soy wax",
    ),
    (
        "Oud candle",
        "50",
        "/uploads/oud.webp",
        "Deep oud with a hint of rose, 220g soy wax",
    ),
    (
        "Sandalwood candle",
        "42.5",
        "/uploads/sandalwood.webp",
        "Creamy sandalwood, 220g soy wax",
    ),
    (
        "Citrus mini set",
        "60",
        "/uploads/citrus-set.webp",
        "Three 70g citrus candles in a gift box",
    ),
];

/// Seed the catalog against `STOREFRONT_DATABASE_URL`.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    db::MIGRATOR.run(&pool).await?;

    let repo = ProductRepository::new(&pool);
    for (name, price, image, description) in DEMO_PRODUCTS {
        let price: Money = price
            .parse()
            .map_err(|e: reign_core::MoneyError| {
                reign_storefront::db::RepositoryError::DataCorruption(e.to_string())
            })?;
        let product = repo.insert(name, price, image, Some(description)).await?;
        info!(id = %product.id, name, "Seeded product");
    }

    info!("Catalog seeding complete!");
    Ok(())
}
