//! # Cart
//!
//! The per-session shopping cart: a mapping from product id to quantity.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Shopper Action          HTTP Route               Cart Change           │
//! │  ──────────────          ──────────               ───────────           │
//! │                                                                         │
//! │  "Add to cart" ─────────► POST /cart/add ───────► add(id, qty)          │
//! │                                                                         │
//! │  Change quantity ───────► POST /cart/update ────► set_quantity(id, n)   │
//! │                                                                         │
//! │  Click remove ──────────► POST /api/cart/remove ► remove(id)            │
//! │                                                                         │
//! │  Empty cart ────────────► POST /api/cart/clear ─► clear()               │
//! │                                                                         │
//! │  View cart ─────────────► GET /api/cart ────────► (read, summarize)     │
//! │                                                                         │
//! │  NOTE: Cart is a plain value. The session layer loads it, the route     │
//! │        mutates it, the session layer compare-and-sets it back.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart never stores prices or titles; those are looked up at read time
//! by [`crate::summary::summarize`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::ProductId;
use crate::validation::{validate_cart_size, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Outcome of [`Cart::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// Entry now holds this quantity.
    Updated(i64),
    /// Entry was removed.
    Removed,
    /// Non-positive quantity for an entry that was not in the cart.
    Unchanged,
}

/// The shopping cart.
///
/// ## Invariants
/// - Entries are unique by product id (adding the same product sums quantities)
/// - Every stored quantity is ≥ 1; setting 0 or less removes the entry
/// - Maximum distinct entries: 100
/// - Maximum quantity per entry: 999
/// - Iteration is in ascending product id order
///
/// ## Session Format
/// Serializes as a JSON object of id → quantity (`{"7": 2}`). Entries with a
/// non-positive quantity are discarded when a stored cart is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ProductId, i64>", into = "BTreeMap<ProductId, i64>")]
pub struct Cart {
    entries: BTreeMap<ProductId, i64>,
}

impl From<BTreeMap<ProductId, i64>> for Cart {
    fn from(mut entries: BTreeMap<ProductId, i64>) -> Self {
        entries.retain(|_, qty| *qty > 0);
        Cart { entries }
    }
}

impl From<Cart> for BTreeMap<ProductId, i64> {
    fn from(cart: Cart) -> Self {
        cart.entries
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the cart or increases its quantity if present.
    ///
    /// The caller is responsible for confirming the product exists in the
    /// catalog first.
    ///
    /// ## Returns
    /// The entry's new quantity.
    ///
    /// ## Errors
    /// - `Validation` if `qty` is not in 1..=999
    /// - `QuantityTooLarge` if the merged quantity would exceed 999
    /// - `CartTooLarge` if this would be the 101st distinct entry
    pub fn add(&mut self, product_id: ProductId, qty: i64) -> CoreResult<i64> {
        validate_quantity(qty)?;

        if let Some(current) = self.entries.get_mut(&product_id) {
            let merged = *current + qty;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            *current = merged;
            return Ok(merged);
        }

        validate_cart_size(self.entries.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;

        self.entries.insert(product_id, qty);
        Ok(qty)
    }

    /// Overwrites the quantity of an entry.
    ///
    /// ## Behavior
    /// - `qty <= 0`: removes the entry (no-op if absent)
    /// - `qty > 0`: sets the quantity, inserting the entry if needed; the
    ///   caller must have confirmed the product exists
    pub fn set_quantity(&mut self, product_id: ProductId, qty: i64) -> CoreResult<CartChange> {
        if qty <= 0 {
            return Ok(if self.remove(product_id) {
                CartChange::Removed
            } else {
                CartChange::Unchanged
            });
        }

        if qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: qty,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if !self.entries.contains_key(&product_id) {
            validate_cart_size(self.entries.len()).map_err(|_| CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            })?;
        }

        self.entries.insert(product_id, qty);
        Ok(CartChange::Updated(qty))
    }

    /// Removes an entry. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.entries.remove(&product_id).is_some()
    }

    /// Removes every listed id. Returns how many entries were removed.
    pub fn prune(&mut self, product_ids: &[ProductId]) -> usize {
        product_ids.iter().filter(|id| self.remove(**id)).count()
    }

    /// Clears all entries from the cart.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns an independent copy of the current contents.
    pub fn snapshot(&self) -> Cart {
        self.clone()
    }

    /// Quantity for a product, if present.
    pub fn quantity(&self, product_id: ProductId) -> Option<i64> {
        self.entries.get(&product_id).copied()
    }

    /// Entries in ascending product id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, i64)> + '_ {
        self.entries.iter().map(|(id, qty)| (*id, *qty))
    }

    /// Product ids in ascending order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.keys().copied().collect()
    }

    /// Returns the number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the total quantity of all entries.
    pub fn total_quantity(&self) -> i64 {
        self.entries.values().sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_same_product_sums_quantity() {
        let mut cart = Cart::new();

        assert_eq!(cart.add(1, 2).unwrap(), 2);
        assert_eq!(cart.add(1, 3).unwrap(), 5);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity(1), Some(5));
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::new();

        assert!(matches!(cart.add(1, 0), Err(CoreError::Validation(_))));
        assert!(matches!(cart.add(1, -2), Err(CoreError::Validation(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_enforces_quantity_cap() {
        let mut cart = Cart::new();
        cart.add(1, 998).unwrap();

        let err = cart.add(1, 2).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { requested: 1000, .. }));
        assert_eq!(cart.quantity(1), Some(998));
    }

    #[test]
    fn test_add_enforces_entry_cap() {
        let mut cart = Cart::new();
        for id in 1..=MAX_CART_ITEMS as i64 {
            cart.add(id, 1).unwrap();
        }

        assert!(matches!(cart.add(1000, 1), Err(CoreError::CartTooLarge { .. })));
        // Existing entries can still grow
        assert_eq!(cart.add(1, 1).unwrap(), 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(4, 3).unwrap();

        assert_eq!(cart.set_quantity(4, 0).unwrap(), CartChange::Removed);
        assert_eq!(cart.snapshot().quantity(4), None);

        // Idempotent
        assert_eq!(cart.set_quantity(4, 0).unwrap(), CartChange::Unchanged);
        assert_eq!(cart.set_quantity(4, -5).unwrap(), CartChange::Unchanged);
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let mut cart = Cart::new();
        cart.add(4, 3).unwrap();

        assert_eq!(cart.set_quantity(4, 7).unwrap(), CartChange::Updated(7));
        assert_eq!(cart.quantity(4), Some(7));

        assert!(cart.set_quantity(4, 1000).is_err());
        assert_eq!(cart.quantity(4), Some(7));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(1, 1).unwrap();

        assert!(!cart.remove(99));
        assert_eq!(cart.len(), 1);
        assert!(cart.remove(1));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_iteration_is_ascending() {
        let mut cart = Cart::new();
        cart.add(9, 1).unwrap();
        cart.add(2, 1).unwrap();
        cart.add(5, 1).unwrap();

        assert_eq!(cart.product_ids(), vec![2, 5, 9]);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_prune_and_clear() {
        let mut cart = Cart::new();
        cart.add(1, 1).unwrap();
        cart.add(2, 1).unwrap();
        cart.add(3, 1).unwrap();

        assert_eq!(cart.prune(&[2, 3, 42]), 2);
        assert_eq!(cart.product_ids(), vec![1]);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_session_format_drops_non_positive_entries() {
        let cart: Cart = serde_json::from_str(r#"{"7": 2, "8": 0, "9": -1}"#).unwrap();
        assert_eq!(cart.product_ids(), vec![7]);

        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json, r#"{"7":2}"#);
    }
}
