//! # Order Repository
//!
//! Permanent order records, one per successful payment capture.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PRE-CHECK                                                          │
//! │     └── find_by_external_id(processor_order_id) → already captured?    │
//! │                                                                         │
//! │  2. CAPTURE (payment processor, outside this crate)                    │
//! │                                                                         │
//! │  3. INSERT                                                             │
//! │     └── insert(NewOrder) → Order { id, created_at }                    │
//! │     └── UNIQUE(external_payment_order_id) rejects a racing duplicate   │
//! │                                                                         │
//! │  Orders are never updated or deleted.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{Money, NewOrder, Order};

const ORDER_COLUMNS: &str =
    "id, fullname, email, address, total_cents, currency, external_payment_order_id, created_at";

/// Row shape of the `orders` table. Money is stored as integer cents.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    fullname: String,
    email: String,
    address: String,
    total_cents: i64,
    currency: String,
    external_payment_order_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            address: row.address,
            total_amount: Money::from_cents(row.total_cents),
            currency: row.currency,
            external_payment_order_id: row.external_payment_order_id,
            created_at: row.created_at,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order. The database assigns the id; the timestamp is now.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The stored order
    /// * `Err(DbError::UniqueViolation)` - An order for this external payment
    ///   order id already exists
    pub async fn insert(&self, order: &NewOrder) -> DbResult<Order> {
        let created_at = Utc::now();

        debug!(
            external_id = ?order.external_payment_order_id,
            total = %order.total_amount,
            currency = %order.currency,
            "Inserting order"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                fullname, email, address,
                total_cents, currency, external_payment_order_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&order.buyer.fullname)
        .bind(&order.buyer.email)
        .bind(&order.buyer.address)
        .bind(order.total_amount.cents())
        .bind(&order.currency)
        .bind(&order.external_payment_order_id)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate(
                "external_payment_order_id",
                order.external_payment_order_id.clone().unwrap_or_default(),
            ),
            other => other,
        })?;

        Ok(Order {
            id: result.last_insert_rowid(),
            fullname: order.buyer.fullname.clone(),
            email: order.buyer.email.clone(),
            address: order.buyer.address.clone(),
            total_amount: order.total_amount,
            currency: order.currency.clone(),
            external_payment_order_id: order.external_payment_order_id.clone(),
            created_at,
        })
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Finds the order created for a processor order id, if any.
    pub async fn find_by_external_id(&self, external_id: &str) -> DbResult<Option<Order>> {
        debug!(external_id = %external_id, "Looking up order by external id");

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE external_payment_order_id = ?1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Gets the total count of orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
