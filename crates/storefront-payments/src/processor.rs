//! # Payment Processor Port
//!
//! The two-phase contract the checkout orchestrator relies on, independent of
//! any particular processor.
//!
//! ```text
//! create_order(units) ──► { id, status: "CREATED" }
//!        ... payer approves in the processor's UI ...
//! capture_order(id)   ──► { id, status: "COMPLETED",
//!                           purchase_units[0].payments.captures[0].amount }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProcessorError, ProcessorResult};
use storefront_core::{Amount, PurchaseUnit};

// =============================================================================
// Processor Responses
// =============================================================================

/// Result of creating a processor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// A single capture inside a captured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    pub amount: Amount,
}

/// Payments recorded against one purchase unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPayments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

/// One purchase unit of a captured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedUnit {
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub payments: Option<UnitPayments>,
}

/// Result of capturing a processor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<CapturedUnit>,
}

impl CapturedOrder {
    /// First capture of the first purchase unit, which carries the amount the
    /// payer was actually charged.
    pub fn first_capture(&self) -> Option<&Capture> {
        self.purchase_units
            .first()?
            .payments
            .as_ref()?
            .captures
            .first()
    }
}

// =============================================================================
// Processor Trait
// =============================================================================

/// A two-phase (create → capture) payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a provisional order with intent CAPTURE.
    async fn create_order(&self, units: &[PurchaseUnit]) -> ProcessorResult<CreatedOrder>;

    /// Captures a previously approved order.
    async fn capture_order(&self, order_id: &str) -> ProcessorResult<CapturedOrder>;
}

/// Stand-in used when no processor credentials are configured. Every call
/// fails with [`ProcessorError::NotConfigured`]; the rest of the store keeps
/// working.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProcessor;

#[async_trait]
impl PaymentProcessor for UnconfiguredProcessor {
    async fn create_order(&self, _units: &[PurchaseUnit]) -> ProcessorResult<CreatedOrder> {
        warn!("Checkout attempted without payment processor credentials");
        Err(ProcessorError::NotConfigured)
    }

    async fn capture_order(&self, _order_id: &str) -> ProcessorResult<CapturedOrder> {
        warn!("Capture attempted without payment processor credentials");
        Err(ProcessorError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_capture_reads_nested_amount() {
        let body = serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{
                "reference_id": "default",
                "payments": {
                    "captures": [{
                        "id": "3C679366HH908993F",
                        "status": "COMPLETED",
                        "amount": { "currency_code": "USD", "value": "45.00" }
                    }]
                }
            }]
        });

        let order: CapturedOrder = serde_json::from_value(body).unwrap();
        let capture = order.first_capture().unwrap();
        assert_eq!(capture.amount.value, "45.00");
        assert_eq!(capture.amount.currency_code, "USD");
    }

    #[test]
    fn test_first_capture_missing() {
        let order: CapturedOrder = serde_json::from_value(serde_json::json!({
            "id": "X",
            "status": "COMPLETED",
            "purchase_units": [{ "reference_id": "default" }]
        }))
        .unwrap();
        assert!(order.first_capture().is_none());

        let bare: CapturedOrder =
            serde_json::from_value(serde_json::json!({ "id": "X", "status": "PENDING" })).unwrap();
        assert!(bare.first_capture().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_processor_refuses() {
        let processor = UnconfiguredProcessor;
        assert!(matches!(
            processor.create_order(&[]).await,
            Err(ProcessorError::NotConfigured)
        ));
        assert!(matches!(
            processor.capture_order("X").await,
            Err(ProcessorError::NotConfigured)
        ));
    }
}
