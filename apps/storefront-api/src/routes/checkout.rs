//! # Checkout Routes
//!
//! ```text
//! POST /api/payments/orders                  ┐
//! POST /api/create-paypal-order              ┘──► { orderId }
//!
//! POST /api/payments/orders/{orderId}/capture ┐
//! POST /api/capture-paypal-order/{orderId}    ┘──► { status: "success",
//!                                                   capturedAmount, currency,
//!                                                   order }
//! ```

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use storefront_core::{BuyerIdentity, Money, Order, PurchaseUnit};

use crate::error::ApiResult;
use crate::extract::{JsonOrForm, SessionToken};
use crate::services::cart;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/orders", post(create_payment_order))
        .route("/api/create-paypal-order", post(create_payment_order))
        .route("/api/payments/orders/{order_id}/capture", post(capture_payment_order))
        .route("/api/capture-paypal-order/{order_id}", post(capture_payment_order))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default, rename = "purchaseUnits", alias = "purchase_units")]
    pub purchase_units: Option<Vec<PurchaseUnit>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptureRequest {
    #[serde(default)]
    pub buyer: Option<BuyerIdentity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub status: &'static str,
    pub captured_amount: Money,
    pub currency: String,
    pub order: Order,
}

/// Starts checkout for the session's cart.
async fn create_payment_order(
    State(state): State<AppState>,
    session: SessionToken,
    JsonOrForm(req): JsonOrForm<CreateOrderRequest>,
) -> ApiResult<(SessionToken, Json<CreateOrderResponse>)> {
    let summary = cart::view(&state, session.as_str()).await?;
    let units = req.purchase_units.unwrap_or_default();

    let created = state.checkout().create_payment_order(&units, &summary).await?;

    Ok((
        session,
        Json(CreateOrderResponse {
            order_id: created.order_id,
        }),
    ))
}

/// Captures an approved payment and records the order.
async fn capture_payment_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    JsonOrForm(req): JsonOrForm<CaptureRequest>,
) -> ApiResult<Json<CaptureResponse>> {
    let captured = state.checkout().capture_order(&order_id, req.buyer).await?;

    Ok(Json(CaptureResponse {
        status: "success",
        captured_amount: captured.captured_amount,
        currency: captured.currency,
        order: captured.order,
    }))
}
