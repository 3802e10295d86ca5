//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Cart and checkout rule violations              │
//! │  └── ValidationError  - Malformed transport input                      │
//! │                                                                         │
//! │  storefront-db errors        → DbError                                 │
//! │  storefront-payments errors  → ProcessorError                          │
//! │  storefront-api errors       → CheckoutError, SessionError, ApiError   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON body + status     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::checkout::{PaymentEvent, PaymentState};
use crate::money::Money;
use crate::types::ProductId;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. The API layer maps each
/// variant to a status code and a user-facing message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    ///
    /// ## When This Occurs
    /// - Adding or updating a product id that was never created
    /// - Product was deleted by the admin after the page was rendered
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Cart has exceeded maximum allowed distinct entries.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout was started without any purchase units.
    #[error("purchase_units required")]
    MissingPurchaseUnits,

    /// Checkout was started with nothing in the cart.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// A purchase unit uses a currency other than the store currency.
    #[error("Currency mismatch: expected {expected}, got {found}")]
    CurrencyMismatch { expected: String, found: String },

    /// The client-declared purchase total differs from the cart total.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart total (server): 20.00
    /// Declared by client:   1.00
    ///      │
    ///      ▼
    /// AmountMismatch → no processor order is created
    /// ```
    #[error("Declared amount {declared} does not match cart total {expected}")]
    AmountMismatch { declared: Money, expected: Money },

    /// A payment state transition that the state machine does not allow.
    #[error("Payment cannot move from {from:?} on {event:?}")]
    InvalidPaymentTransition {
        from: PaymentState,
        event: PaymentEvent,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while coercing stringly-typed transport data (JSON or form fields)
/// into typed requests, before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (non-numeric id, malformed decimal, bad email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an InvalidFormat error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
