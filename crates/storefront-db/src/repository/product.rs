//! # Product Repository
//!
//! Read access to the catalog, plus the few writes the admin panel and the
//! tests need.
//!
//! ## Key Operations
//! - Lookup by id (cart add/update existence checks, product detail)
//! - Batch lookup (one query per cart summary)
//! - Filtered, paginated listing (catalog browsing)
//!
//! ## Listing Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/products?q=lamp&category=home&price_max=50&sort=price_asc    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductFilter (validated in storefront-core)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE 1=1                                                             │
//! │    AND (title LIKE '%lamp%' OR description LIKE '%lamp%')              │
//! │    AND category = 'home'                                               │
//! │    AND price_cents <= 5000                                             │
//! │  ORDER BY price ASC, id ASC                                            │
//! │  LIMIT 9 OFFSET 0                                                      │
//! │       │                                                                 │
//! │       ├── same WHERE with COUNT(*) → total                             │
//! │       ▼                                                                 │
//! │  Page { items, total, page, per_page }                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are stored as decimal TEXT, so range filters and price sorting
//! compare the rounded integer cents value of the text.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{Page, Product, ProductFilter, ProductId, ProductSort};

const PRODUCT_COLUMNS: &str = "id, title, description, price, currency, image, category, rating";

const PRICE_CENTS: &str = "CAST(ROUND(CAST(price AS REAL) * 100) AS INTEGER)";

/// Escapes LIKE wildcards so user text matches literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Appends the WHERE clause shared by the count and page queries.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    qb.push(" WHERE 1=1");

    if let Some(text) = &filter.query {
        let pattern = like_pattern(text);
        qb.push(" AND (LOWER(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }

    if let Some(min) = filter.price_min {
        qb.push(format!(" AND {PRICE_CENTS} >= ")).push_bind(min.cents());
    }

    if let Some(max) = filter.price_max {
        qb.push(format!(" AND {PRICE_CENTS} <= ")).push_bind(max.cents());
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        debug!(id = id, "Fetching product");

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Fetches every product whose id is listed. Missing ids are simply
    /// absent from the result.
    pub async fn get_many(&self, ids: &[ProductId]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Fetching products by id");

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Lists products matching a filter, one page at a time.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Page<Product>> {
        debug!(?filter, "Listing products");

        let mut count_qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut qb, filter);
        qb.push(match filter.sort {
            ProductSort::PriceAsc => format!(" ORDER BY {PRICE_CENTS} ASC, id ASC"),
            ProductSort::PriceDesc => format!(" ORDER BY {PRICE_CENTS} DESC, id DESC"),
            ProductSort::Newest => " ORDER BY id DESC".to_string(),
        });
        qb.push(" LIMIT ")
            .push_bind(i64::from(filter.per_page))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let items = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(total = total, returned = items.len(), "Listed products");

        Ok(Page {
            items,
            total,
            page: filter.page,
            per_page: filter.per_page,
        })
    }

    /// Inserts a product with an explicit id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, title, description, price, currency, image, category, rating)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.price)
        .bind(&product.currency)
        .bind(&product.image)
        .bind(&product.category)
        .bind(product.rating)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Deletes a product. Carts that still reference it drop the line on
    /// their next read.
    pub async fn delete(&self, id: ProductId) -> DbResult<()> {
        debug!(id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Gets the total count of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
