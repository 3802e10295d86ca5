//! # Cart Service
//!
//! Session cart operations: load, mutate with compare-and-swap, reconcile
//! against the live catalog.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Request                                         │
//! │                                                                         │
//! │   add / update ──► product exists? ──no──► 404                         │
//! │        │                 │                                              │
//! │        │                yes                                             │
//! │        ▼                 ▼                                              │
//! │   ┌──────────────────────────────────────────────┐                     │
//! │   │  mutate (max 3 attempts)                     │                     │
//! │   │   load ──► apply op to a copy ──► CAS        │── lost 3x ──► 409   │
//! │   └──────────────────────────────────────────────┘                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   reconcile                                                             │
//! │   ├── get_many(ids) from the catalog                                   │
//! │   ├── summarize (storefront-core)                                      │
//! │   ├── dropped ids ──► pruned from the stored cart                      │
//! │   └── unpriced ids ──► WARN                                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   CartSummary { items, total, count }                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use storefront_core::{summarize, Cart, CartSummary, CatalogSnapshot, CoreError, CoreResult, ProductId};

use crate::error::ApiResult;
use crate::session::{SessionError, VersionedCart};
use crate::state::AppState;

/// Compare-and-swap attempts before giving up with `SessionError::Contention`.
pub const MAX_CAS_ATTEMPTS: u32 = 3;

// =============================================================================
// Operations
// =============================================================================

/// Current cart, priced against the catalog.
pub async fn view(state: &AppState, token: &str) -> ApiResult<CartSummary> {
    let stored = state.sessions.load(token).await?;
    reconcile(state, token, stored).await
}

/// Adds `qty` of a product, merging into an existing entry.
pub async fn add(
    state: &AppState,
    token: &str,
    product_id: ProductId,
    qty: i64,
) -> ApiResult<CartSummary> {
    debug!(product_id, qty, "Adding to cart");
    ensure_product_exists(state, product_id).await?;
    mutate(state, token, |cart| cart.add(product_id, qty).map(|_| ())).await
}

/// Overwrites a quantity; `qty <= 0` removes the entry.
pub async fn update(
    state: &AppState,
    token: &str,
    product_id: ProductId,
    qty: i64,
) -> ApiResult<CartSummary> {
    debug!(product_id, qty, "Updating cart quantity");
    if qty > 0 {
        ensure_product_exists(state, product_id).await?;
    }
    mutate(state, token, |cart| cart.set_quantity(product_id, qty).map(|_| ())).await
}

/// Removes an entry. Absent entries are a no-op.
pub async fn remove(state: &AppState, token: &str, product_id: ProductId) -> ApiResult<CartSummary> {
    debug!(product_id, "Removing from cart");
    mutate(state, token, |cart| {
        cart.remove(product_id);
        Ok(())
    })
    .await
}

/// Empties the cart.
pub async fn clear(state: &AppState, token: &str) -> ApiResult<CartSummary> {
    debug!("Clearing cart");
    mutate(state, token, |cart| {
        cart.clear();
        Ok(())
    })
    .await
}

// =============================================================================
// Internals
// =============================================================================

async fn ensure_product_exists(state: &AppState, product_id: ProductId) -> ApiResult<()> {
    match state.db.products().get_by_id(product_id).await? {
        Some(_) => Ok(()),
        None => Err(CoreError::ProductNotFound(product_id).into()),
    }
}

/// Load → apply `op` to a copy → compare-and-swap, retried on a lost race.
///
/// A failing `op` aborts without writing. An `op` that leaves the cart
/// unchanged skips the write.
async fn mutate<F>(state: &AppState, token: &str, op: F) -> ApiResult<CartSummary>
where
    F: Fn(&mut Cart) -> CoreResult<()> + Send,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let stored = state.sessions.load(token).await?;

        let mut cart = stored.cart.clone();
        op(&mut cart)?;

        if cart == stored.cart {
            return reconcile(state, token, stored).await;
        }

        if state
            .sessions
            .compare_and_swap(token, stored.version, &cart)
            .await?
        {
            let written = VersionedCart {
                cart,
                version: stored.version + 1,
            };
            return reconcile(state, token, written).await;
        }

        debug!(attempt, "Cart write lost a race, retrying");
    }

    warn!(attempts = MAX_CAS_ATTEMPTS, "Giving up on contended cart write");
    Err(SessionError::Contention.into())
}

/// Prices the stored cart and prunes entries whose product is gone.
async fn reconcile(state: &AppState, token: &str, stored: VersionedCart) -> ApiResult<CartSummary> {
    let products = state.db.products().get_many(&stored.cart.product_ids()).await?;
    let catalog = CatalogSnapshot::from_products(products);
    let reconciliation = summarize(&stored.cart, &catalog);

    if !reconciliation.unpriced.is_empty() {
        warn!(
            product_ids = ?reconciliation.unpriced,
            "Cart contains products with unreadable prices, priced at 0.00"
        );
    }

    if reconciliation.has_dropped() {
        let mut pruned = stored.cart.clone();
        let removed = pruned.prune(&reconciliation.dropped);

        // Best effort: a lost race leaves the ids for the next read to prune
        match state
            .sessions
            .compare_and_swap(token, stored.version, &pruned)
            .await
        {
            Ok(true) => info!(
                product_ids = ?reconciliation.dropped,
                removed,
                "Pruned deleted products from cart"
            ),
            Ok(false) => debug!("Cart changed before deleted products could be pruned"),
            Err(e) => warn!(error = %e, "Failed to prune deleted products from cart"),
        }
    }

    Ok(reconciliation.summary)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::config::StorefrontConfig;
    use crate::session::{SessionResult, SessionStore};
    use crate::test_support::{product, test_db, test_state, FakeProcessor};
    use storefront_core::Money;

    const TOKEN: &str = "session-a";

    #[tokio::test]
    async fn test_new_session_is_empty() {
        let state = test_state().await;
        let summary = view(&state, TOKEN).await.unwrap();
        assert!(summary.items.is_empty());
        assert_eq!(summary.total, Money::zero());
        assert_eq!(summary.count, 0);
    }

    #[tokio::test]
    async fn test_add_merges_quantities() {
        let state = test_state().await;
        add(&state, TOKEN, 7, 2).await.unwrap();
        let summary = add(&state, TOKEN, 7, 3).await.unwrap();

        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].quantity, 5);
        assert_eq!(summary.total, Money::from_cents(5000));
        assert_eq!(summary.count, 5);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let state = test_state().await;
        let err = add(&state, TOKEN, 999, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(view(&state, TOKEN).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let state = test_state().await;
        let err = add(&state, TOKEN, 7, 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes() {
        let state = test_state().await;
        add(&state, TOKEN, 7, 2).await.unwrap();

        let summary = update(&state, TOKEN, 7, 0).await.unwrap();
        assert!(summary.items.is_empty());

        let stored = state.sessions.load(TOKEN).await.unwrap();
        assert_eq!(stored.cart.quantity(7), None);
    }

    #[tokio::test]
    async fn test_update_missing_product_with_zero_is_ok() {
        let state = test_state().await;
        assert!(update(&state, TOKEN, 999, 0).await.is_ok());
        assert!(update(&state, TOKEN, 999, 2).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let state = test_state().await;
        add(&state, TOKEN, 7, 1).await.unwrap();
        add(&state, TOKEN, 8, 1).await.unwrap();

        let summary = remove(&state, TOKEN, 7).await.unwrap();
        assert_eq!(summary.items.len(), 1);
        assert!(remove(&state, TOKEN, 7).await.is_ok());

        let summary = clear(&state, TOKEN).await.unwrap();
        assert!(summary.items.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_product_is_dropped_and_pruned() {
        let state = test_state().await;
        add(&state, TOKEN, 7, 2).await.unwrap();
        add(&state, TOKEN, 8, 1).await.unwrap();

        state.db.products().delete(8).await.unwrap();

        let summary = view(&state, TOKEN).await.unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total, Money::from_cents(2000));

        let stored = state.sessions.load(TOKEN).await.unwrap();
        assert_eq!(stored.cart.product_ids(), vec![7]);
    }

    #[tokio::test]
    async fn test_unparseable_price_is_zero() {
        let state = test_state().await;
        state
            .db
            .products()
            .insert(&product(50, "Mystery", "abc"))
            .await
            .unwrap();

        let summary = add(&state, TOKEN, 50, 1).await.unwrap();
        assert_eq!(summary.items[0].unit_price, Money::zero());
        assert_eq!(summary.total, Money::zero());
    }

    #[tokio::test]
    async fn test_price_comes_from_current_catalog() {
        let state = test_state().await;
        add(&state, TOKEN, 7, 2).await.unwrap();

        state.db.products().delete(7).await.unwrap();
        state
            .db
            .products()
            .insert(&product(7, "Desk Lamp", "12.50"))
            .await
            .unwrap();

        let summary = view(&state, TOKEN).await.unwrap();
        assert_eq!(summary.items[0].line_subtotal, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let state = test_state().await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let state = state.clone();
            handles.push(tokio::spawn(async move { add(&state, TOKEN, 7, 1).await }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        let stored = state.sessions.load(TOKEN).await.unwrap();
        assert_eq!(stored.cart.quantity(7), Some(succeeded));
    }

    /// Store whose every write loses the race.
    #[derive(Default)]
    struct AlwaysContended {
        writes: AtomicU32,
    }

    #[async_trait]
    impl SessionStore for AlwaysContended {
        async fn load(&self, _token: &str) -> SessionResult<VersionedCart> {
            Ok(VersionedCart::default())
        }

        async fn compare_and_swap(
            &self,
            _token: &str,
            _expected_version: u64,
            _cart: &Cart,
        ) -> SessionResult<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        async fn remove(&self, _token: &str) -> SessionResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_max_cas_attempts() {
        let sessions = Arc::new(AlwaysContended::default());
        let state = AppState::new(
            test_db().await,
            sessions.clone(),
            Arc::new(FakeProcessor::completing("10.00")),
            StorefrontConfig::default(),
        );

        let err = add(&state, TOKEN, 7, 1).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(sessions.writes.load(Ordering::SeqCst), MAX_CAS_ATTEMPTS);
    }
}
