//! # Checkout Orchestrator
//!
//! Two-phase payment: create a processor order for the current cart, then
//! capture it once the payer approves and record the Order exactly once.
//!
//! ## Payment Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Create → Capture                                     │
//! │                                                                         │
//! │  create_payment_order(units, cart)                                     │
//! │   ├── units empty ─────────────────────► MissingPurchaseUnits (400)    │
//! │   ├── cart empty ──────────────────────► EmptyCart (400)               │
//! │   ├── Σ units ≠ cart total ────────────► AmountMismatch (400)          │
//! │   └── processor.create_order ──────────► { orderId }   None → Created  │
//! │                                                                         │
//! │        ... payer approves in the processor's UI ...                    │
//! │                                                                         │
//! │  capture_order(orderId, buyer?)                                        │
//! │   ├── id not [A-Za-z0-9-] ─────────────► Validation (400)              │
//! │   ├── order row exists ────────────────► AlreadyCaptured (409)         │
//! │   ├── processor.capture_order                                          │
//! │   │    ├── error / not COMPLETED ──────► CaptureRejected (502)         │
//! │   │    └── COMPLETED ──────────────────► Created → Captured            │
//! │   └── insert Order(captured amount)                                    │
//! │        ├── UNIQUE violation ───────────► AlreadyCaptured (409)         │
//! │        └── other failure ──────────────► Persistence (500, logged)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Order always records the processor-confirmed captured amount, never
//! the amount declared at create time. No lock is held between the phases.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use storefront_core::checkout::{capture_event, verify_purchase_units};
use storefront_core::validation::{validate_buyer, validate_payment_order_id};
use storefront_core::{
    BuyerIdentity, CartSummary, CoreError, Money, NewOrder, Order, PaymentEvent, PaymentState,
    PurchaseUnit, ValidationError,
};
use storefront_db::{Database, DbError};
use storefront_payments::{PaymentProcessor, ProcessorError};

// =============================================================================
// Errors
// =============================================================================

/// Checkout workflow errors.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A checkout rule was violated before any processor call.
    #[error(transparent)]
    Rule(#[from] CoreError),

    /// An Order for this processor order already exists.
    #[error("Payment order {0} has already been captured")]
    AlreadyCaptured(String),

    /// The processor refused the capture or reported it incomplete.
    #[error("Payment capture for {order_id} was rejected: {reason}")]
    CaptureRejected { order_id: String, reason: String },

    /// The processor could not be used at all.
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Money moved but the Order could not be recorded.
    #[error("Captured payment {order_id} could not be recorded: {source}")]
    Persistence { order_id: String, source: DbError },
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Rule(CoreError::Validation(err))
    }
}

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Outcomes
// =============================================================================

/// A processor order awaiting payer approval.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPayment {
    pub order_id: String,
    pub declared_total: Money,
    pub state: PaymentState,
}

/// A completed capture and the Order it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPayment {
    pub order: Order,
    pub captured_amount: Money,
    pub currency: String,
    pub state: PaymentState,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives the create → capture workflow.
pub struct CheckoutOrchestrator {
    db: Database,
    processor: Arc<dyn PaymentProcessor>,
    currency: String,
}

impl CheckoutOrchestrator {
    pub fn new(db: Database, processor: Arc<dyn PaymentProcessor>, currency: &str) -> Self {
        Self {
            db,
            processor,
            currency: currency.to_string(),
        }
    }

    /// Creates a processor order after checking the declared units against
    /// the server-side cart. Nothing is written locally.
    pub async fn create_payment_order(
        &self,
        units: &[PurchaseUnit],
        cart: &CartSummary,
    ) -> CheckoutResult<CreatedPayment> {
        let declared_total = verify_purchase_units(units, cart, &self.currency)?;

        let created = self.processor.create_order(units).await?;
        let state = PaymentState::None.transition(PaymentEvent::OrderCreated)?;

        info!(
            order_id = %created.id,
            total = %declared_total,
            "Payment order created"
        );

        Ok(CreatedPayment {
            order_id: created.id,
            declared_total,
            state,
        })
    }

    /// Captures an approved order and records it.
    ///
    /// `buyer` is validated when given; otherwise the placeholder identity
    /// is recorded.
    pub async fn capture_order(
        &self,
        order_id: &str,
        buyer: Option<BuyerIdentity>,
    ) -> CheckoutResult<CapturedPayment> {
        let order_id = order_id.trim();
        validate_payment_order_id(order_id)?;

        let buyer = match buyer {
            Some(buyer) => validate_buyer(&buyer)?,
            None => BuyerIdentity::placeholder(),
        };

        let existing = self
            .db
            .orders()
            .find_by_external_id(order_id)
            .await
            .map_err(|source| CheckoutError::Persistence {
                order_id: order_id.to_string(),
                source,
            })?;
        if existing.is_some() {
            warn!(order_id = %order_id, "Duplicate capture attempt");
            return Err(CheckoutError::AlreadyCaptured(order_id.to_string()));
        }

        let captured = match self.processor.capture_order(order_id).await {
            Ok(captured) => captured,
            Err(ProcessorError::Rejected { status, body }) => {
                warn!(order_id = %order_id, status, body = %body, "Capture rejected by processor");
                return Err(CheckoutError::CaptureRejected {
                    order_id: order_id.to_string(),
                    reason: format!("processor returned status {status}"),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let state = PaymentState::Created.transition(capture_event(&captured.status))?;
        if state == PaymentState::Failed {
            warn!(order_id = %order_id, status = %captured.status, "Capture not completed");
            return Err(CheckoutError::CaptureRejected {
                order_id: order_id.to_string(),
                reason: format!("capture status {}", captured.status),
            });
        }

        let capture = captured
            .first_capture()
            .ok_or_else(|| CheckoutError::CaptureRejected {
                order_id: order_id.to_string(),
                reason: "response contains no capture".to_string(),
            })?;

        let captured_amount = capture.amount.to_money().map_err(|e| {
            error!(
                order_id = %order_id,
                value = %capture.amount.value,
                "Reconciliation gap: captured amount is unreadable"
            );
            CheckoutError::Processor(ProcessorError::InvalidResponse(e.to_string()))
        })?;
        let currency = capture.amount.currency_code.clone();

        let new_order = NewOrder {
            buyer,
            total_amount: captured_amount,
            currency: currency.clone(),
            external_payment_order_id: Some(order_id.to_string()),
        };

        let order = match self.db.orders().insert(&new_order).await {
            Ok(order) => order,
            Err(e) if e.is_unique_violation() => {
                warn!(order_id = %order_id, "Concurrent capture already recorded this order");
                return Err(CheckoutError::AlreadyCaptured(order_id.to_string()));
            }
            Err(source) => {
                return Err(CheckoutError::Persistence {
                    order_id: order_id.to_string(),
                    source,
                })
            }
        };

        info!(
            order_id = %order_id,
            local_id = order.id,
            amount = %captured_amount,
            currency = %currency,
            "Payment captured and order recorded"
        );

        Ok(CapturedPayment {
            order,
            captured_amount,
            currency,
            state,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
