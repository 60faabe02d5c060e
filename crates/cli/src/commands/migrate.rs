//! Database migration command.
//!
//! Applies the storefront migrations embedded in `reign-storefront`.
//! Safe to re-run; already-applied migrations are skipped.

use reign_storefront::db;

use super::CommandError;

/// Run storefront migrations against `STOREFRONT_DATABASE_URL`.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
