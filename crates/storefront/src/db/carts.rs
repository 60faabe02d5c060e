//! Cart repository.
//!
//! Carts are keyed by customer identity. The increment in [`add_item`] is a
//! single `ON CONFLICT` upsert so that two concurrent adds for the same
//! product both land: a read-modify-write here would lose one of them.
//! `set_quantity` and `remove_item` are absolute operations where
//! last-write-wins is the intended semantic.
//!
//! [`add_item`]: CartRepository::add_item

use chrono::Utc;
use sqlx::SqlitePool;

use reign_core::{Email, Money, ProductId};

use super::RepositoryError;
use crate::models::{CartItem, CartView, CartViewItem};

/// Repository for cart reads and mutations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Cart contents hydrated against the catalog at current values.
    ///
    /// Items whose product has been deleted are silently dropped from the
    /// view; the stored rows are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for undecodable stored values.
    pub async fn view(&self, identity: &Email) -> Result<CartView, RepositoryError> {
        let rows = sqlx::query_as::<_, CartViewRow>(
            "SELECT ci.product_id, ci.quantity, p.name, p.price, p.image
             FROM cart_item ci
             JOIN product p ON p.id = ci.product_id
             WHERE ci.identity = ?1
             ORDER BY ci.product_id",
        )
        .bind(identity.as_str())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartViewRow::into_view_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CartView { items })
    }

    /// Raw stored cart rows, without catalog hydration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, identity: &Email) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT product_id, quantity FROM cart_item
             WHERE identity = ?1 ORDER BY product_id",
        )
        .bind(identity.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(product_id, quantity)| {
                let quantity = u32::try_from(quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "cart quantity out of range: {quantity}"
                    ))
                })?;
                Ok(CartItem {
                    product_id: ProductId::new(product_id),
                    quantity,
                })
            })
            .collect()
    }

    /// Add `quantity` of a product, merging into the existing row if present.
    ///
    /// The increment is a single atomic upsert; callers must have validated
    /// that the product exists in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn add_item(
        &self,
        identity: &Email,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        touch_cart(&mut tx, identity).await?;
        sqlx::query(
            "INSERT INTO cart_item (identity, product_id, quantity)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (identity, product_id)
             DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(identity.as_str())
        .bind(product_id)
        .bind(i64::from(quantity))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Set a row's quantity to exactly `quantity`.
    ///
    /// A quantity below one removes the row instead; quantities never go
    /// below one in storage. There is no implicit insert through this path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `quantity >= 1` and the cart
    /// has no row for this product.
    pub async fn set_quantity(
        &self,
        identity: &Email,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        if quantity < 1 {
            return self.remove_item(identity, product_id).await;
        }

        let mut tx = self.pool.begin().await?;

        touch_cart(&mut tx, identity).await?;
        let result = sqlx::query(
            "UPDATE cart_item SET quantity = ?3
             WHERE identity = ?1 AND product_id = ?2",
        )
        .bind(identity.as_str())
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a row if present. Absent rows are a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn remove_item(
        &self,
        identity: &Email,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        touch_cart(&mut tx, identity).await?;
        sqlx::query("DELETE FROM cart_item WHERE identity = ?1 AND product_id = ?2")
            .bind(identity.as_str())
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Empty the cart. Idempotent; creates the cart row if it did not exist,
    /// so the empty state is guaranteed either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn clear(&self, identity: &Email) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        touch_cart(&mut tx, identity).await?;
        sqlx::query("DELETE FROM cart_item WHERE identity = ?1")
            .bind(identity.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Upsert the cart row and bump `updated_at`. Every mutation goes through
/// this, which is also what creates carts lazily.
async fn touch_cart(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    identity: &Email,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO cart (identity, updated_at) VALUES (?1, ?2)
         ON CONFLICT (identity) DO UPDATE SET updated_at = excluded.updated_at",
    )
    .bind(identity.as_str())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Raw hydrated row before monetary parsing.
#[derive(sqlx::FromRow)]
struct CartViewRow {
    product_id: i64,
    quantity: i64,
    name: String,
    price: String,
    image: String,
}

impl CartViewRow {
    fn into_view_item(self) -> Result<CartViewItem, RepositoryError> {
        let price: Money = self.price.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("cart quantity out of range: {}", self.quantity))
        })?;
        Ok(CartViewItem {
            product_id: ProductId::new(self.product_id),
            name: self.name,
            price,
            image: self.image,
            quantity,
            line_total: price * quantity,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::ProductRepository;
    use crate::db::test_support::memory_pool;
    use chrono::{DateTime, Utc};
    use reign_core::Money;

    fn identity(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    async fn seed_product(pool: &SqlitePool, name: &str, price: &str) -> ProductId {
        ProductRepository::new(pool)
            .insert(name, price.parse::<Money>().unwrap(), "/uploads/p.webp", None)
            .await
            .unwrap()
            .id
    }

    async fn cart_updated_at(pool: &SqlitePool, identity: &Email) -> Option<DateTime<Utc>> {
        sqlx::query_as::<_, (DateTime<Utc>,)>("SELECT updated_at FROM cart WHERE identity = ?1")
            .bind(identity.as_str())
            .fetch_optional(pool)
            .await
            .unwrap()
            .map(|(ts,)| ts)
    }

    #[tokio::test]
    async fn test_add_inserts_then_merges() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.add_item(&user, p1, 1).await.unwrap();
        assert_eq!(
            carts.items(&user).await.unwrap(),
            vec![CartItem { product_id: p1, quantity: 1 }]
        );

        // Same product again: quantity merges into the one row.
        carts.add_item(&user, p1, 3).await.unwrap();
        assert_eq!(
            carts.items(&user).await.unwrap(),
            vec![CartItem { product_id: p1, quantity: 4 }]
        );
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_increments() {
        let pool = memory_pool().await;
        let user = identity("racer@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        let n = 16;
        let mut handles = Vec::new();
        for _ in 0..n {
            let pool = pool.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                CartRepository::new(&pool).add_item(&user, p1, 1).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let items = CartRepository::new(&pool).items(&user).await.unwrap();
        assert_eq!(items, vec![CartItem { product_id: p1, quantity: n }]);
    }

    #[tokio::test]
    async fn test_set_quantity_is_absolute() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.add_item(&user, p1, 5).await.unwrap();
        carts.set_quantity(&user, p1, 2).await.unwrap();
        assert_eq!(
            carts.items(&user).await.unwrap(),
            vec![CartItem { product_id: p1, quantity: 2 }]
        );
    }

    #[tokio::test]
    async fn test_set_quantity_below_one_removes() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.add_item(&user, p1, 1).await.unwrap();
        carts.set_quantity(&user, p1, 0).await.unwrap();
        assert!(carts.items(&user).await.unwrap().is_empty());

        // Negative quantities behave the same and are not an error.
        carts.set_quantity(&user, p1, -3).await.unwrap();
        assert!(carts.items(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_missing_row_is_not_found() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        assert!(matches!(
            carts.set_quantity(&user, p1, 2).await,
            Err(RepositoryError::NotFound)
        ));
        // No implicit insert happened.
        assert!(carts.items(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.remove_item(&user, p1).await.unwrap();
        assert!(carts.items(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_keeps_cart_row() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.add_item(&user, p1, 2).await.unwrap();
        carts.clear(&user).await.unwrap();
        assert!(carts.items(&user).await.unwrap().is_empty());

        carts.clear(&user).await.unwrap();
        assert!(carts.items(&user).await.unwrap().is_empty());

        // The cart record itself persists after clearing.
        assert!(cart_updated_at(&pool, &user).await.is_some());
    }

    #[tokio::test]
    async fn test_mutations_bump_updated_at() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.add_item(&user, p1, 1).await.unwrap();
        let first = cart_updated_at(&pool, &user).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        carts.set_quantity(&user, p1, 3).await.unwrap();
        let second = cart_updated_at(&pool, &user).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_view_drops_deleted_products() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let products = ProductRepository::new(&pool);
        let user = identity("user@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;
        let p2 = seed_product(&pool, "Oud candle", "50").await;

        carts.add_item(&user, p1, 1).await.unwrap();
        carts.add_item(&user, p2, 2).await.unwrap();

        products.delete(p1).await.unwrap();

        let view = carts.view(&user).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product_id, p2);
        assert_eq!(view.items[0].line_total, "100".parse().unwrap());

        // The stored row survives; only the view filters it.
        assert_eq!(carts.items(&user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_carts_are_partitioned_by_identity() {
        let pool = memory_pool().await;
        let carts = CartRepository::new(&pool);
        let alice = identity("alice@example.com");
        let bob = identity("bob@example.com");
        let p1 = seed_product(&pool, "Amber candle", "35").await;

        carts.add_item(&alice, p1, 1).await.unwrap();
        assert!(carts.items(&bob).await.unwrap().is_empty());
    }
}
