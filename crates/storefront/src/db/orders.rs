//! Order repository.
//!
//! Line items are serialized to a JSON column at insert time; that snapshot
//! is the whole point - an order must read back exactly as it was priced,
//! whatever has happened to the catalog since. Status is the only mutable
//! column, and updates are guarded on the expected current value.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use reign_core::{Coordinates, Money, OrderId, OrderStatus, PaymentMethod};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderLineItem};

/// Repository for order persistence.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new order with `status = pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, or
    /// `RepositoryError::DataCorruption` if the items fail to serialize.
    pub async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let items_json = serde_json::to_string(&order.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize order items: {e}"))
        })?;
        let created_at = Utc::now();
        let status = OrderStatus::Pending;

        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO orders (customer_name, contact, payment_method,
                                 delivery_lat, delivery_lng, delivery_address,
                                 meetup_location_id, items, subtotal,
                                 delivery_fee, total, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             RETURNING id",
        )
        .bind(&order.customer_name)
        .bind(&order.contact)
        .bind(order.payment_method.as_str())
        .bind(order.delivery_coordinates.map(|c| c.lat))
        .bind(order.delivery_coordinates.map(|c| c.lng))
        .bind(&order.delivery_address)
        .bind(&order.meetup_location_id)
        .bind(&items_json)
        .bind(order.subtotal.amount().to_string())
        .bind(order.delivery_fee.amount().to_string())
        .bind(order.total.amount().to_string())
        .bind(status.as_str())
        .bind(created_at)
        .fetch_one(self.pool)
        .await?;

        Ok(Order {
            id: OrderId::new(id),
            customer_name: order.customer_name,
            contact: order.contact,
            payment_method: order.payment_method,
            delivery_coordinates: order.delivery_coordinates,
            delivery_address: order.delivery_address,
            meetup_location_id: order.meetup_location_id,
            items: order.items,
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            total: order.total,
            status,
            created_at,
        })
    }

    /// Get an order by id. `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for undecodable stored values.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, customer_name, contact, payment_method,
                    delivery_lat, delivery_lng, delivery_address,
                    meetup_location_id, items, subtotal, delivery_fee,
                    total, status, created_at
             FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for undecodable stored values.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, customer_name, contact, payment_method,
                    delivery_lat, delivery_lng, delivery_address,
                    meetup_location_id, items, subtotal, delivery_fee,
                    total, status, created_at
             FROM orders ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// Move an order from `from` to `to`, guarded on the current status.
    ///
    /// Transition legality is the caller's concern; this only guarantees the
    /// row still holds `from` at write time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the status changed underneath
    /// the caller, `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ?3 WHERE id = ?1 AND status = ?2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Distinguish a vanished order from a concurrent status change.
            let exists = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM orders WHERE id = ?1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?
                .is_some();
            return Err(if exists {
                RepositoryError::Conflict(format!("order {id} status changed concurrently"))
            } else {
                RepositoryError::NotFound
            });
        }
        Ok(())
    }
}

/// Raw order row before domain parsing.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_name: String,
    contact: String,
    payment_method: String,
    delivery_lat: Option<f64>,
    delivery_lng: Option<f64>,
    delivery_address: Option<String>,
    meetup_location_id: Option<String>,
    items: String,
    subtotal: String,
    delivery_fee: String,
    total: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let corrupt = |what: &str, detail: String| {
            RepositoryError::DataCorruption(format!("invalid {what} in database: {detail}"))
        };

        let payment_method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(|e: reign_core::StatusParseError| corrupt("payment method", e.to_string()))?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e: reign_core::StatusParseError| corrupt("status", e.to_string()))?;
        let items: Vec<OrderLineItem> = serde_json::from_str(&self.items)
            .map_err(|e| corrupt("order items", e.to_string()))?;
        let subtotal: Money = self
            .subtotal
            .parse()
            .map_err(|e: reign_core::MoneyError| corrupt("subtotal", e.to_string()))?;
        let delivery_fee: Money = self
            .delivery_fee
            .parse()
            .map_err(|e: reign_core::MoneyError| corrupt("delivery fee", e.to_string()))?;
        let total: Money = self
            .total
            .parse()
            .map_err(|e: reign_core::MoneyError| corrupt("total", e.to_string()))?;

        let delivery_coordinates = match (self.delivery_lat, self.delivery_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        Ok(Order {
            id: OrderId::new(self.id),
            customer_name: self.customer_name,
            contact: self.contact,
            payment_method,
            delivery_coordinates,
            delivery_address: self.delivery_address,
            meetup_location_id: self.meetup_location_id,
            items,
            subtotal,
            delivery_fee,
            total,
            status,
            created_at: self.created_at,
        })
    }
}
