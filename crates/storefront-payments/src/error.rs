//! # Processor Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Processor Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotConfigured  │  │  Http           │  │  Rejected (4xx/5xx)     │ │
//! │  │                 │  │  Timeout        │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for processor operations.
pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// Everything that can go wrong talking to the payment processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Credentials are missing, so no request can be made.
    #[error("Payment processor is not configured")]
    NotConfigured,

    /// The request could not be sent or the response could not be read.
    #[error("Payment processor request failed: {0}")]
    Http(String),

    /// The processor did not answer within the configured timeout.
    #[error("Payment processor timed out after {0} seconds")]
    Timeout(u64),

    /// The processor answered with a non-success status.
    ///
    /// ## When This Occurs
    /// - 401 on bad credentials
    /// - 422 when an order cannot be captured (already captured, declined)
    /// - 404 for an unknown order id
    #[error("Payment processor rejected the request with status {status}")]
    Rejected { status: u16, body: String },

    /// A success response whose body does not have the expected shape.
    #[error("Unexpected payment processor response: {0}")]
    InvalidResponse(String),
}

impl ProcessorError {
    /// Maps a reqwest transport error, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProcessorError::Timeout(timeout_secs)
        } else if err.is_decode() {
            ProcessorError::InvalidResponse(err.to_string())
        } else {
            ProcessorError::Http(err.to_string())
        }
    }
}
