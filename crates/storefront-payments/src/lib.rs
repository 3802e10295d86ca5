//! # storefront-payments: Payment Processor Integration
//!
//! Talks to the external payment processor (PayPal Orders v2) on behalf of
//! the checkout orchestrator.
//!
//! ## Module Organization
//!
//! - [`processor`] - The [`PaymentProcessor`] trait and its response types
//! - [`paypal`] - REST client with cached OAuth token
//! - [`error`] - Processor error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_payments::{PayPalClient, PayPalConfig, PaymentProcessor};
//!
//! let client = PayPalClient::new(PayPalConfig::sandbox(id, secret))?;
//! let created = client.create_order(&units).await?;
//! ```

pub mod error;
pub mod paypal;
pub mod processor;

pub use error::{ProcessorError, ProcessorResult};
pub use paypal::{PayPalClient, PayPalConfig, LIVE_BASE_URL, SANDBOX_BASE_URL};
pub use processor::{
    Capture, CapturedOrder, CapturedUnit, CreatedOrder, PaymentProcessor, UnconfiguredProcessor,
    UnitPayments,
};
