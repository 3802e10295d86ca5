//! # Application State
//!
//! Shared handles every handler receives through `State<AppState>`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │   Database   │  │  SessionStore    │  │   PaymentProcessor       │  │
//! │  │  (SQLite     │  │  (Redis or       │  │   (PayPal or             │  │
//! │  │   pool)      │  │   memory)        │  │    unconfigured)         │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  StorefrontConfig (read-only after startup)                      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • SessionStore: compare-and-swap per cart, no request-level lock      │
//! │  • Config: immutable behind Arc                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use storefront_db::Database;
use storefront_payments::PaymentProcessor;

use crate::config::StorefrontConfig;
use crate::services::checkout::CheckoutOrchestrator;
use crate::session::SessionStore;

/// Cheap-to-clone handle to everything a request needs.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<dyn SessionStore>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub config: Arc<StorefrontConfig>,
}

impl AppState {
    pub fn new(
        db: Database,
        sessions: Arc<dyn SessionStore>,
        processor: Arc<dyn PaymentProcessor>,
        config: StorefrontConfig,
    ) -> Self {
        Self {
            db,
            sessions,
            processor,
            config: Arc::new(config),
        }
    }

    /// Store currency every cart and payment is denominated in.
    pub fn currency(&self) -> &str {
        &self.config.store.currency
    }

    /// Checkout orchestrator bound to this state's collaborators.
    pub fn checkout(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            self.db.clone(),
            Arc::clone(&self.processor),
            self.currency(),
        )
    }
}
