//! # Routes
//!
//! HTTP surface of the storefront.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Router                                               │
//! │                                                                         │
//! │  TraceLayer (tower-http) ── one span per request                       │
//! │       │                                                                 │
//! │       ├── cart.rs      /api/cart, /cart/add, /cart/update, ...         │
//! │       ├── checkout.rs  /api/payments/orders[/{id}/capture] + aliases   │
//! │       ├── product.rs   /api/products[/{id}]                            │
//! │       └── /health      "OK"                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod checkout;
pub mod product;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(product::routes())
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Router Tests
// =============================================================================
