//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Browser                     Rust Backend                               │
//! │  ───────                     ────────────                               │
//! │                                                                         │
//! │  POST /cart/add                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ──── DbError::QueryFailed("...") ──┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Validation Error? ── CoreError::Validation ───── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  HTTP 400                                                               │
//! │  { "success": false,                                                    │
//! │    "code": "VALIDATION_ERROR",                                          │
//! │    "error": "Invalid qty: must be an integer" }                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal details (SQL errors, Redis errors, processor bodies) are logged
//! and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::services::checkout::CheckoutError;
use crate::session::SessionError;
use storefront_core::{CoreError, ValidationError};
use storefront_db::DbError;
use storefront_payments::ProcessorError;

/// Result type alias for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Checkout rule violated, e.g. amount mismatch (400)
    CheckoutError,

    /// Conflicting state, e.g. order already captured (409)
    Conflict,

    /// Payment processor refused or failed (502)
    PaymentError,

    /// Payment processor not configured (503)
    PaymentUnavailable,

    /// Payment processor timed out (504)
    PaymentTimeout,

    /// Database operation failed (500)
    DatabaseError,

    /// Session storage failed (500)
    SessionError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for the code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::CheckoutError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PaymentError => StatusCode::BAD_GATEWAY,
            ErrorCode::PaymentUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::PaymentTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::DatabaseError | ErrorCode::SessionError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// { "success": false, "code": "NOT_FOUND", "error": "Product not found: 7" }
/// ```
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: ErrorCode,
    error: &'a str,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            code: self.code,
            error: &self.message,
        };
        (self.status(), Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::Validation(e) => ApiError::from(e),
            e @ (CoreError::CartTooLarge { .. } | CoreError::QuantityTooLarge { .. }) => {
                ApiError::validation(e.to_string())
            }
            e @ (CoreError::MissingPurchaseUnits
            | CoreError::EmptyCart
            | CoreError::CurrencyMismatch { .. }
            | CoreError::AmountMismatch { .. }) => {
                ApiError::new(ErrorCode::CheckoutError, e.to_string())
            }
            e @ CoreError::InvalidPaymentTransition { .. } => {
                ApiError::new(ErrorCode::Conflict, e.to_string())
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, please retry")
            }
            other => {
                // Log the actual error but return a generic message
                error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts processor errors to API errors.
impl From<ProcessorError> for ApiError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::NotConfigured => ApiError::new(
                ErrorCode::PaymentUnavailable,
                "Online payment is not available",
            ),
            ProcessorError::Timeout(secs) => {
                error!(timeout_secs = secs, "Payment processor timed out");
                ApiError::new(ErrorCode::PaymentTimeout, "Payment processor timed out")
            }
            other => {
                error!(error = %other, "Payment processor call failed");
                ApiError::new(ErrorCode::PaymentError, "Payment processor request failed")
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Contention => ApiError::new(ErrorCode::Conflict, err.to_string()),
            other => {
                error!(error = %other, "Session storage failed");
                ApiError::new(ErrorCode::SessionError, "Cart storage is unavailable")
            }
        }
    }
}

/// Converts checkout errors to API errors.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rule(e) => ApiError::from(e),
            e @ CheckoutError::AlreadyCaptured(_) => {
                ApiError::new(ErrorCode::Conflict, e.to_string())
            }
            e @ CheckoutError::CaptureRejected { .. } => {
                ApiError::new(ErrorCode::PaymentError, e.to_string())
            }
            CheckoutError::Processor(e) => ApiError::from(e),
            CheckoutError::Persistence { order_id, source } => {
                // Money moved but no order row exists
                error!(
                    order_id = %order_id,
                    error = %source,
                    "Reconciliation gap: captured payment was not recorded"
                );
                ApiError::internal(
                    "Payment was captured but the order could not be saved; support has been notified",
                )
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
