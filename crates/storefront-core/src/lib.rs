//! # storefront-core: Pure Business Logic for the Storefront
//!
//! This crate is the **heart** of the storefront. It contains the cart,
//! the reconciler and the checkout rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser (catalog + cart pages)               │   │
//! │  │    Browse ──► Add to cart ──► PayPal button ──► Confirmation    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON / form over HTTP                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storefront-api (axum)                        │   │
//! │  │    sessions, cart routes, checkout orchestrator                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ storefront-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  money   │ │   cart   │ │ summary  │ │ checkout │          │   │
//! │  │   │  Money   │ │   Cart   │ │summarize │ │PaymentSt.│          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        storefront-db (SQLite)   storefront-payments (PayPal)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, PurchaseUnit, Order, etc.)
//! - [`money`] - Money type with integer arithmetic and decimal wire format
//! - [`cart`] - The per-session cart value
//! - [`summary`] - Cart reconciliation against the live catalog
//! - [`checkout`] - Payment state machine and declared-amount cross-check
//! - [`validation`] - Transport input coercion and business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::{summarize, Cart, CatalogSnapshot, Product};
//!
//! let mut cart = Cart::new();
//! cart.add(7, 2).unwrap();
//!
//! let lamp = Product {
//!     id: 7,
//!     title: "Lamp".to_string(),
//!     description: None,
//!     price: "10.00".to_string(),
//!     currency: "USD".to_string(),
//!     image: None,
//!     category: None,
//!     rating: None,
//! };
//!
//! let result = summarize(&cart, &CatalogSnapshot::from_products([lamp]));
//! assert_eq!(result.summary.total.to_string(), "20.00");
//! assert_eq!(result.summary.count, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartChange};
pub use checkout::{PaymentEvent, PaymentState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use summary::{summarize, CartLine, CartSummary, CatalogSnapshot, Reconciliation};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Store currency when none is configured.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Maximum distinct entries allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps session payloads small.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single entry in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Catalog page size when `per_page` is omitted.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Upper bound for `per_page`.
pub const MAX_PAGE_SIZE: u32 = 100;
