//! # Catalog Routes
//!
//! Read-only catalog browsing.
//!
//! ```text
//! GET /api/products?q=lamp&category=home&price_min=5&price_max=50&sort=price_asc&page=2
//!      ──► { products: [...], total, page, pages, per_page }
//!
//! GET /api/products/{id}
//!      ──► product JSON, or 404
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

use storefront_core::validation::{build_product_filter, coerce_integer, Loose, ProductQuery};
use storefront_core::Product;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub pages: i64,
    pub per_page: u32,
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let filter = build_product_filter(&query)?;
    debug!(?filter, "Listing products");

    let page = state.db.products().list(&filter).await?;
    let pages = page.pages();

    Ok(Json(ProductListResponse {
        products: page.items,
        total: page.total,
        page: page.page,
        pages,
        per_page: page.per_page,
    }))
}

async fn get_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = coerce_integer("id", &Loose::Text(raw_id))?;

    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}
