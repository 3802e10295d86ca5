//! # Cart Routes
//!
//! ```text
//! GET  /api/cart                     ──► { items, total, count }
//! POST /cart/add | /api/cart/add     ──► { success: true, cart }
//! POST /cart/update                  ──► { success: true, cart }   qty ≤ 0 removes
//! POST /api/cart/remove              ──► { success: true, cart }
//! POST /api/cart/clear               ──► { success: true, cart }
//! ```
//!
//! Bodies may be JSON (`{"productId": 7, "qty": 2}`) or form-encoded
//! (`product_id=7&qty=2`). Ids and quantities are coerced here and never
//! defaulted when malformed.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use storefront_core::validation::{parse_product_id, parse_quantity, Loose};
use storefront_core::CartSummary;

use crate::error::ApiResult;
use crate::extract::{JsonOrForm, SessionToken};
use crate::services::cart;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/cart/update", post(update_cart_item))
        .route("/api/cart/remove", post(remove_from_cart))
        .route("/api/cart/clear", post(clear_cart))
}

/// Cart mutation body.
#[derive(Debug, Default, Deserialize)]
pub struct CartItemRequest {
    #[serde(default, rename = "productId", alias = "product_id")]
    pub product_id: Option<Loose>,
    #[serde(default, alias = "quantity")]
    pub qty: Option<Loose>,
}

/// Mutation response.
#[derive(Debug, Serialize)]
pub struct CartEnvelope {
    pub success: bool,
    pub cart: CartSummary,
}

impl From<CartSummary> for CartEnvelope {
    fn from(cart: CartSummary) -> Self {
        CartEnvelope {
            success: true,
            cart,
        }
    }
}

async fn get_cart(
    State(state): State<AppState>,
    session: SessionToken,
) -> ApiResult<(SessionToken, Json<CartSummary>)> {
    let summary = cart::view(&state, session.as_str()).await?;
    Ok((session, Json(summary)))
}

async fn add_to_cart(
    State(state): State<AppState>,
    session: SessionToken,
    JsonOrForm(req): JsonOrForm<CartItemRequest>,
) -> ApiResult<(SessionToken, Json<CartEnvelope>)> {
    let product_id = parse_product_id(req.product_id.as_ref())?;
    let qty = match req.qty.as_ref() {
        Some(value) => parse_quantity(Some(value))?,
        None => 1,
    };

    let summary = cart::add(&state, session.as_str(), product_id, qty).await?;
    Ok((session, Json(summary.into())))
}

async fn update_cart_item(
    State(state): State<AppState>,
    session: SessionToken,
    JsonOrForm(req): JsonOrForm<CartItemRequest>,
) -> ApiResult<(SessionToken, Json<CartEnvelope>)> {
    let product_id = parse_product_id(req.product_id.as_ref())?;
    let qty = parse_quantity(req.qty.as_ref())?;

    let summary = cart::update(&state, session.as_str(), product_id, qty).await?;
    Ok((session, Json(summary.into())))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    session: SessionToken,
    JsonOrForm(req): JsonOrForm<CartItemRequest>,
) -> ApiResult<(SessionToken, Json<CartEnvelope>)> {
    let product_id = parse_product_id(req.product_id.as_ref())?;

    let summary = cart::remove(&state, session.as_str(), product_id).await?;
    Ok((session, Json(summary.into())))
}

async fn clear_cart(
    State(state): State<AppState>,
    session: SessionToken,
) -> ApiResult<(SessionToken, Json<CartEnvelope>)> {
    let summary = cart::clear(&state, session.as_str()).await?;
    Ok((session, Json(summary.into())))
}
