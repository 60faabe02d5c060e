//! Product catalog repository.
//!
//! The catalog is an external collaborator from the cart/order core's point
//! of view: the core only ever reads it. The write methods here exist for
//! seeding (`reign-cli seed`) and tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use reign_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::Product;

/// Raw catalog row before monetary parsing.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: String,
    image: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, RepositoryError> {
        let price: Money = self.price.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            price,
            image: self.image,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

/// Repository for catalog reads (and seed-time writes).
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by id. `None` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price, image, description, created_at
             FROM product WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Fetch several products at once, keyed by id. Ids that no longer
    /// resolve are simply absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_many(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, name, price, image, description, created_at
             FROM product WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(self.pool).await?;

        rows.into_iter()
            .map(|row| row.into_product().map(|p| (p.id, p)))
            .collect()
    }

    /// Insert a catalog row, returning it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        name: &str,
        price: Money,
        image: &str,
        description: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let created_at = Utc::now();
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO product (name, price, image, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, price, image, description, created_at",
        )
        .bind(name)
        .bind(price.amount().to_string())
        .bind(image)
        .bind(description)
        .bind(created_at)
        .fetch_one(self.pool)
        .await?;

        row.into_product()
    }

    /// Update a product's current price. Existing orders are unaffected by
    /// design; they carry their own frozen copy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_price(&self, id: ProductId, price: Money) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE product SET price = ?2 WHERE id = ?1")
            .bind(id)
            .bind(price.amount().to_string())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product from the catalog.
    ///
    /// Carts referencing it keep their rows; those rows simply stop showing
    /// up in hydrated cart views.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let product = repo
            .insert("Amber candle", "35".parse().unwrap(), "/uploads/a.webp", None)
            .await
            .unwrap();

        let fetched = repo.get(product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);
        assert_eq!(fetched.price, "35".parse().unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);
        assert!(repo.get(ProductId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let a = repo
            .insert("Amber candle", "35".parse().unwrap(), "/uploads/a.webp", None)
            .await
            .unwrap();
        let b = repo
            .insert("Oud candle", "50".parse().unwrap(), "/uploads/o.webp", None)
            .await
            .unwrap();

        let found = repo
            .get_many(&[a.id, b.id, ProductId::new(999)])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&a.id].name, "Amber candle");
        assert!(!found.contains_key(&ProductId::new(999)));

        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_price() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let product = repo
            .insert("Oud candle", "50".parse().unwrap(), "/uploads/o.webp", None)
            .await
            .unwrap();
        repo.set_price(product.id, "55".parse().unwrap())
            .await
            .unwrap();

        let fetched = repo.get(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, "55".parse().unwrap());

        assert!(matches!(
            repo.set_price(ProductId::new(999), "1".parse().unwrap()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let product = repo
            .insert("Seasonal", "20".parse().unwrap(), "/uploads/s.webp", None)
            .await
            .unwrap();
        assert!(repo.delete(product.id).await.unwrap());
        assert!(!repo.delete(product.id).await.unwrap());
        assert!(repo.get(product.id).await.unwrap().is_none());
    }
}
