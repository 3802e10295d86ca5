//! Shared fixtures for handler and service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use storefront_core::{
    summarize, Amount, BuyerIdentity, Cart, CartSummary, CatalogSnapshot, Money, NewOrder, Product,
    PurchaseUnit,
};
use storefront_db::{Database, DbConfig};
use storefront_payments::{
    Capture, CapturedOrder, CapturedUnit, CreatedOrder, PaymentProcessor, ProcessorError,
    ProcessorResult, UnitPayments,
};

use crate::config::StorefrontConfig;
use crate::session::MemorySessionStore;
use crate::state::AppState;

pub(crate) fn product(id: i64, title: &str, price: &str) -> Product {
    Product {
        id,
        title: title.to_string(),
        description: Some(format!("A fine {}", title.to_lowercase())),
        price: price.to_string(),
        currency: "USD".to_string(),
        image: Some(format!("/images/{id}.jpg")),
        category: Some("home".to_string()),
        rating: Some(4.0),
    }
}

/// In-memory database with Lamp (7, 10.00) and Mug (8, 5.50).
pub(crate) async fn test_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let products = db.products();
    products.insert(&product(7, "Lamp", "10.00")).await.unwrap();
    products.insert(&product(8, "Mug", "5.50")).await.unwrap();
    db
}

pub(crate) async fn test_state() -> AppState {
    test_state_with(Arc::new(FakeProcessor::completing("20.00"))).await
}

pub(crate) async fn test_state_with(processor: Arc<FakeProcessor>) -> AppState {
    let config = StorefrontConfig::default();
    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(config.session.ttl_secs)));
    AppState::new(test_db().await, sessions, processor, config)
}

/// Summary of a cart built from `(product id, qty)` pairs.
pub(crate) async fn summary_of(db: &Database, entries: &[(i64, i64)]) -> CartSummary {
    let mut cart = Cart::new();
    for (id, qty) in entries {
        cart.add(*id, *qty).unwrap();
    }
    let products = db.products().get_many(&cart.product_ids()).await.unwrap();
    summarize(&cart, &CatalogSnapshot::from_products(products)).summary
}

pub(crate) fn usd_unit(value: &str) -> PurchaseUnit {
    PurchaseUnit {
        reference_id: None,
        amount: Amount::new("USD", Money::parse_decimal(value).unwrap()),
    }
}

// =============================================================================
// Fake Processor
// =============================================================================

enum Behavior {
    Complete { status: String, amount: String },
    NoCaptures,
    Reject(u16),
}

/// Database change made while a capture is in flight.
pub(crate) enum DuringCapture {
    /// Another request records the same processor order first.
    RecordOrder(Database),
    /// The database goes away before the Order is written.
    CloseDatabase(Database),
}

/// Processor double that counts calls.
pub(crate) struct FakeProcessor {
    behavior: Behavior,
    during_capture: Option<DuringCapture>,
    creates: AtomicUsize,
    captures: AtomicUsize,
}

impl FakeProcessor {
    /// Captures complete with the given USD amount.
    pub(crate) fn completing(amount: &str) -> Self {
        Self::with_status("COMPLETED", amount)
    }

    pub(crate) fn with_status(status: &str, amount: &str) -> Self {
        Self::new(Behavior::Complete {
            status: status.to_string(),
            amount: amount.to_string(),
        })
    }

    /// Every call is refused with the given HTTP status.
    pub(crate) fn rejecting(status: u16) -> Self {
        Self::new(Behavior::Reject(status))
    }

    /// Captures complete but the response lists no capture.
    pub(crate) fn without_captures() -> Self {
        Self::new(Behavior::NoCaptures)
    }

    pub(crate) fn during_capture(mut self, effect: DuringCapture) -> Self {
        self.during_capture = Some(effect);
        self
    }

    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            during_capture: None,
            creates: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
        }
    }

    pub(crate) fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_order(&self, _units: &[PurchaseUnit]) -> ProcessorResult<CreatedOrder> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            Behavior::Complete { .. } | Behavior::NoCaptures => Ok(CreatedOrder {
                id: format!("PAY-{n}"),
                status: "CREATED".to_string(),
            }),
            Behavior::Reject(status) => Err(ProcessorError::Rejected {
                status: *status,
                body: "{}".to_string(),
            }),
        }
    }

    async fn capture_order(&self, order_id: &str) -> ProcessorResult<CapturedOrder> {
        self.captures.fetch_add(1, Ordering::SeqCst);

        match &self.during_capture {
            Some(DuringCapture::RecordOrder(db)) => {
                let order = NewOrder {
                    buyer: BuyerIdentity::placeholder(),
                    total_amount: Money::from_cents(1000),
                    currency: "USD".to_string(),
                    external_payment_order_id: Some(order_id.to_string()),
                };
                db.orders().insert(&order).await.unwrap();
            }
            Some(DuringCapture::CloseDatabase(db)) => db.close().await,
            None => {}
        }

        match &self.behavior {
            Behavior::Complete { status, amount } => Ok(CapturedOrder {
                id: order_id.to_string(),
                status: status.clone(),
                purchase_units: vec![CapturedUnit {
                    reference_id: Some("default".to_string()),
                    payments: Some(UnitPayments {
                        captures: vec![Capture {
                            id: format!("CAP-{order_id}"),
                            status: status.clone(),
                            amount: Amount {
                                currency_code: "USD".to_string(),
                                value: amount.clone(),
                            },
                        }],
                    }),
                }],
            }),
            Behavior::NoCaptures => Ok(CapturedOrder {
                id: order_id.to_string(),
                status: "COMPLETED".to_string(),
                purchase_units: vec![],
            }),
            Behavior::Reject(status) => Err(ProcessorError::Rejected {
                status: *status,
                body: r#"{"name":"UNPROCESSABLE_ENTITY"}"#.to_string(),
            }),
        }
    }
}
