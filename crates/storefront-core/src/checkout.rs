//! # Checkout Rules
//!
//! The pure half of the checkout workflow: the payment state machine and the
//! create-time cross-check of client-declared purchase units.
//!
//! ## Payment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────┐  OrderCreated   ┌─────────┐  CaptureCompleted  ┌────────┐ │
//! │   │  None  │────────────────►│ Created │───────────────────►│Captured│ │
//! │   └────────┘                 └────┬────┘                    └────────┘ │
//! │                                   │ CaptureRejected                     │
//! │                                   ▼                                     │
//! │                              ┌────────┐                                 │
//! │                              │ Failed │                                 │
//! │                              └────────┘                                 │
//! │                                                                         │
//! │  Captured and Failed are terminal. Anything else is an error.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The I/O half (processor calls, order persistence) lives in the API
//! server's checkout service.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::summary::CartSummary;
use crate::types::PurchaseUnit;

/// Processor capture status that means the money moved.
pub const CAPTURE_COMPLETED: &str = "COMPLETED";

// =============================================================================
// Payment State Machine
// =============================================================================

/// Local view of a payment's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentState {
    #[default]
    None,
    Created,
    Captured,
    Failed,
}

/// Something that happened at the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    OrderCreated,
    CaptureCompleted,
    CaptureRejected,
}

impl PaymentState {
    /// Applies an event, or fails if the transition is not allowed.
    pub fn transition(self, event: PaymentEvent) -> CoreResult<PaymentState> {
        match (self, event) {
            (PaymentState::None, PaymentEvent::OrderCreated) => Ok(PaymentState::Created),
            (PaymentState::Created, PaymentEvent::CaptureCompleted) => Ok(PaymentState::Captured),
            (PaymentState::Created, PaymentEvent::CaptureRejected) => Ok(PaymentState::Failed),
            (from, event) => Err(CoreError::InvalidPaymentTransition { from, event }),
        }
    }

    /// Whether no further events are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentState::Captured | PaymentState::Failed)
    }
}

/// Maps a processor capture status onto the state machine event.
pub fn capture_event(status: &str) -> PaymentEvent {
    if status.eq_ignore_ascii_case(CAPTURE_COMPLETED) {
        PaymentEvent::CaptureCompleted
    } else {
        PaymentEvent::CaptureRejected
    }
}

// =============================================================================
// Create-Time Cross-Check
// =============================================================================

/// Checks client-declared purchase units against the server-side cart.
///
/// ## Rules (in order)
/// 1. At least one purchase unit → else `MissingPurchaseUnits`
/// 2. Cart has at least one priced line → else `EmptyCart`
/// 3. Every unit uses the store currency → else `CurrencyMismatch`
/// 4. Every unit amount parses as a decimal above zero → else `Validation`
/// 5. Σ unit amounts fits in `Money` → else `Validation`
/// 6. Σ unit amounts == cart total → else `AmountMismatch`
///
/// ## Returns
/// The verified declared total.
pub fn verify_purchase_units(
    units: &[PurchaseUnit],
    cart: &CartSummary,
    store_currency: &str,
) -> CoreResult<Money> {
    if units.is_empty() {
        return Err(CoreError::MissingPurchaseUnits);
    }
    if cart.items.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut declared = Money::zero();
    for unit in units {
        if unit.amount.currency_code != store_currency {
            return Err(CoreError::CurrencyMismatch {
                expected: store_currency.to_string(),
                found: unit.amount.currency_code.clone(),
            });
        }
        let amount = unit.amount.to_money()?;
        if amount <= Money::zero() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }
        declared = declared
            .checked_add(amount)
            .ok_or_else(|| ValidationError::invalid("amount", "value is too large"))?;
    }

    if declared != cart.total {
        return Err(CoreError::AmountMismatch {
            declared,
            expected: cart.total,
        });
    }

    Ok(declared)
}

// =============================================================================
// Unit Tests
// =============================================================================
