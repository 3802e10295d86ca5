//! # PayPal Orders v2 Client
//!
//! [`PaymentProcessor`] implementation over the PayPal REST API.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PayPal Request Flow                              │
//! │                                                                         │
//! │  ┌────────────────┐                           ┌─────────────────┐      │
//! │  │  PayPalClient  │                           │  PayPal API     │      │
//! │  └───────┬────────┘                           └────────┬────────┘      │
//! │          │  1. POST /v1/oauth2/token                   │               │
//! │          │     Basic client_id:secret                  │               │
//! │          │     grant_type=client_credentials           │               │
//! │          │────────────────────────────────────────────►│               │
//! │          │◄────────────────────────────────────────────│               │
//! │          │     { access_token, expires_in }            │               │
//! │          │                                             │               │
//! │          │  2. POST /v2/checkout/orders                │               │
//! │          │     Bearer token, intent CAPTURE            │               │
//! │          │────────────────────────────────────────────►│               │
//! │          │◄──────────── { id, status: CREATED } ───────│               │
//! │          │                                             │               │
//! │          │  3. POST /v2/checkout/orders/{id}/capture   │               │
//! │          │────────────────────────────────────────────►│               │
//! │          │◄──────────── { status: COMPLETED, ... } ────│               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Token Storage
//! The access token is cached in memory and refreshed 60 seconds before it
//! expires. Every request uses the configured timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ProcessorError, ProcessorResult};
use crate::processor::{CapturedOrder, CreatedOrder, PaymentProcessor};
use storefront_core::PurchaseUnit;

/// PayPal sandbox endpoint.
pub const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";

/// PayPal live endpoint.
pub const LIVE_BASE_URL: &str = "https://api-m.paypal.com";

/// Margin before token expiration to trigger refresh.
const REFRESH_MARGIN_SECS: u64 = 60;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for [`PayPalClient`].
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Sandbox or live API root, without a trailing slash.
    pub base_url: String,
    /// Applied to every request.
    pub timeout: Duration,
}

impl PayPalConfig {
    /// Sandbox configuration with a 30 second timeout.
    pub fn sandbox(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: SANDBOX_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the API root (used by tests to point at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Token Cache
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct TokenInfo {
    access_token: String,
    expires_at: Instant,
}

impl TokenInfo {
    fn needs_refresh(&self) -> bool {
        Instant::now() + Duration::from_secs(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

// =============================================================================
// Client
// =============================================================================

/// PayPal REST client.
pub struct PayPalClient {
    http: Client,
    config: PayPalConfig,
    token: Arc<RwLock<Option<TokenInfo>>>,
}

impl PayPalClient {
    /// Builds the HTTP client with the configured timeout.
    pub fn new(config: PayPalConfig) -> ProcessorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProcessorError::Http(e.to_string()))?;

        info!(base_url = %config.base_url, "PayPal client initialized");

        Ok(Self {
            http,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.config.timeout.as_secs()
    }

    /// Joins path segments onto the API root. Each segment is
    /// percent-encoded, so `/`, `?` and `..` inside one stay in that segment.
    fn url(&self, segments: &[&str]) -> ProcessorResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ProcessorError::Http(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ProcessorError::Http("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Returns a valid access token, fetching a new one when needed.
    async fn access_token(&self) -> ProcessorResult<String> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if !token.needs_refresh() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;

        // Double-check after acquiring write lock
        if let Some(token) = guard.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting PayPal access token");

        let response = self
            .http
            .post(self.url(&["v1", "oauth2", "token"])?)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ProcessorError::from_transport(e, self.timeout_secs()))?;

        let token: TokenResponse = self.read_json(response).await?;
        let info = TokenInfo {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        };
        let access_token = info.access_token.clone();
        *guard = Some(info);

        debug!(expires_in = token.expires_in, "PayPal access token refreshed");
        Ok(access_token)
    }

    /// Checks the status and decodes the body.
    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> ProcessorResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "PayPal rejected request");
            return Err(ProcessorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProcessorError::from_transport(e, self.timeout_secs()))?;
        serde_json::from_slice(&bytes).map_err(|e| ProcessorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentProcessor for PayPalClient {
    async fn create_order(&self, units: &[PurchaseUnit]) -> ProcessorResult<CreatedOrder> {
        let token = self.access_token().await?;

        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": units,
        });

        let response = self
            .http
            .post(self.url(&["v2", "checkout", "orders"])?)
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProcessorError::from_transport(e, self.timeout_secs()))?;

        let order: CreatedOrder = self.read_json(response).await?;
        info!(order_id = %order.id, status = %order.status, "PayPal order created");
        Ok(order)
    }

    async fn capture_order(&self, order_id: &str) -> ProcessorResult<CapturedOrder> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(self.url(&["v2", "checkout", "orders", order_id, "capture"])?)
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| ProcessorError::from_transport(e, self.timeout_secs()))?;

        let order: CapturedOrder = self.read_json(response).await?;
        info!(order_id = %order.id, status = %order.status, "PayPal order captured");
        Ok(order)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use storefront_core::{Amount, Money};

    fn client_for(server: &MockServer) -> PayPalClient {
        let config = PayPalConfig::sandbox("client-id", "secret").with_base_url(server.base_url());
        PayPalClient::new(config).unwrap()
    }

    fn units() -> Vec<PurchaseUnit> {
        vec![PurchaseUnit {
            reference_id: None,
            amount: Amount::new("USD", Money::from_cents(2000)),
        }]
    }

    async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/oauth2/token")
                    .header_exists("authorization")
                    .body_contains("grant_type=client_credentials");
                then.status(200).json_body(serde_json::json!({
                    "access_token": "A21AAF",
                    "token_type": "Bearer",
                    "expires_in": 32400
                }));
            })
            .await
    }

    #[tokio::test]
    async fn test_create_order_sends_capture_intent() {
        let server = MockServer::start_async().await;
        let token = mock_token(&server).await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/checkout/orders")
                    .header("authorization", "Bearer A21AAF")
                    .json_body_partial(r#"{"intent":"CAPTURE"}"#);
                then.status(201).json_body(serde_json::json!({
                    "id": "5O190127TN364715T",
                    "status": "CREATED"
                }));
            })
            .await;

        let order = client_for(&server).create_order(&units()).await.unwrap();

        assert_eq!(order.id, "5O190127TN364715T");
        assert_eq!(order.status, "CREATED");
        token.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_is_cached_between_calls() {
        let server = MockServer::start_async().await;
        let token = mock_token(&server).await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/checkout/orders");
                then.status(201)
                    .json_body(serde_json::json!({ "id": "A", "status": "CREATED" }));
            })
            .await;

        let client = client_for(&server);
        client.create_order(&units()).await.unwrap();
        client.create_order(&units()).await.unwrap();

        token.assert_hits_async(1).await;
        create.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_capture_order_parses_amount() {
        let server = MockServer::start_async().await;
        mock_token(&server).await;
        let capture = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/checkout/orders/5O190127TN364715T/capture");
                then.status(201).json_body(serde_json::json!({
                    "id": "5O190127TN364715T",
                    "status": "COMPLETED",
                    "purchase_units": [{
                        "reference_id": "default",
                        "payments": { "captures": [{
                            "id": "3C679366HH908993F",
                            "status": "COMPLETED",
                            "amount": { "currency_code": "USD", "value": "45.00" }
                        }]}
                    }]
                }));
            })
            .await;

        let order = client_for(&server)
            .capture_order("5O190127TN364715T")
            .await
            .unwrap();

        assert_eq!(order.status, "COMPLETED");
        let amount = &order.first_capture().unwrap().amount;
        assert_eq!(amount.to_money().unwrap(), Money::from_cents(4500));
        capture.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_capture_surfaces_status() {
        let server = MockServer::start_async().await;
        mock_token(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/checkout/orders/DONE/capture");
                then.status(422).json_body(serde_json::json!({
                    "name": "UNPROCESSABLE_ENTITY",
                    "details": [{ "issue": "ORDER_ALREADY_CAPTURED" }]
                }));
            })
            .await;

        let err = client_for(&server).capture_order("DONE").await.unwrap_err();
        match err {
            ProcessorError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("ORDER_ALREADY_CAPTURED"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_order_id_stays_one_path_segment() {
        let server = MockServer::start_async().await;
        mock_token(&server).await;
        let payouts = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/payments/payouts");
                then.status(201).json_body(serde_json::json!({
                    "id": "X",
                    "status": "COMPLETED",
                    "purchase_units": []
                }));
            })
            .await;

        let err = client_for(&server)
            .capture_order("X/../../../../v1/payments/payouts?")
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessorError::Rejected { status: 404, .. }));
        payouts.assert_hits_async(0).await;
    }

    #[test]
    fn test_url_encodes_segments() {
        let config = PayPalConfig::sandbox("id", "secret").with_base_url("http://127.0.0.1:9000/");
        let client = PayPalClient::new(config).unwrap();

        let url = client
            .url(&["v2", "checkout", "orders", "A/B?c", "capture"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/v2/checkout/orders/A%2FB%3Fc/capture"
        );
    }

    #[tokio::test]
    async fn test_bad_credentials_are_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/oauth2/token");
                then.status(401)
                    .json_body(serde_json::json!({ "error": "invalid_client" }));
            })
            .await;

        let err = client_for(&server).create_order(&units()).await.unwrap_err();
        assert!(matches!(err, ProcessorError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start_async().await;
        mock_token(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/checkout/orders");
                then.status(201).body("not json");
            })
            .await;

        let err = client_for(&server).create_order(&units()).await.unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_processor_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/oauth2/token");
                then.status(200)
                    .delay(Duration::from_millis(1500))
                    .json_body(serde_json::json!({ "access_token": "A", "expires_in": 60 }));
            })
            .await;

        let config = PayPalConfig::sandbox("id", "secret")
            .with_base_url(server.base_url())
            .with_timeout(Duration::from_millis(200));
        let client = PayPalClient::new(config).unwrap();

        let err = client.create_order(&units()).await.unwrap_err();
        assert!(matches!(err, ProcessorError::Timeout(_)));
    }
}
