//! # Cart Reconciler
//!
//! Joins cart entries against the live catalog to produce a priced,
//! display-ready summary.
//!
//! ## Reconciliation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart {3: 1, 7: 2, 9: 1}                                               │
//! │       │                                                                 │
//! │       │   CatalogSnapshot (products fetched for ids 3, 7, 9)           │
//! │       │        3 → price "abc"   7 → price "10.00"   9 → (missing)     │
//! │       ▼                                                                 │
//! │  summarize() ← THIS MODULE                                             │
//! │       │                                                                 │
//! │       ├── line 3: unit 0.00, listed in `unpriced`                      │
//! │       ├── line 7: unit 10.00 × 2 = 20.00                               │
//! │       └── id 9 skipped, listed in `dropped`                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { items: [3, 7], total: "20.00", count: 3 }                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices always come from the catalog at read time. Nothing here aborts on
//! bad data: missing products are dropped and unparseable prices count as
//! zero, and both are reported so the caller can log and prune.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::money::Money;
use crate::types::{Product, ProductId};

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// Products resolved for one summarize call, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: HashMap<ProductId, Product>,
}

impl CatalogSnapshot {
    /// Indexes a batch of products (typically from `get_many`).
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, product_id: ProductId) -> Option<&Product> {
        self.products.get(&product_id)
    }
}

// =============================================================================
// Summary Types
// =============================================================================

/// One priced line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_subtotal: Money,
    /// Image reference, empty when the product has none.
    pub image: String,
}

/// Display-ready cart. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    /// Sum of line subtotals.
    pub total: Money,
    /// Sum of quantities.
    pub count: i64,
}

/// A summary plus what had to be skipped or zero-priced to build it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub summary: CartSummary,
    /// Cart ids with no catalog record.
    pub dropped: Vec<ProductId>,
    /// Cart ids whose stored price failed to parse and were priced at 0.00.
    pub unpriced: Vec<ProductId>,
}

impl Reconciliation {
    /// Whether the stored cart references products that no longer exist.
    pub fn has_dropped(&self) -> bool {
        !self.dropped.is_empty()
    }
}

// =============================================================================
// Summarize
// =============================================================================

/// Prices every cart entry against the catalog snapshot.
///
/// ## Guarantees
/// - Lines are in ascending product id order
/// - `total == Σ unit_price × quantity` over the emitted lines
/// - `count == Σ quantity` over the emitted lines
pub fn summarize(cart: &Cart, catalog: &CatalogSnapshot) -> Reconciliation {
    let mut reconciliation = Reconciliation::default();

    for (product_id, quantity) in cart.iter() {
        let Some(product) = catalog.get(product_id) else {
            reconciliation.dropped.push(product_id);
            continue;
        };

        let unit_price = match product.unit_price() {
            Ok(price) => price,
            Err(_) => {
                reconciliation.unpriced.push(product_id);
                Money::zero()
            }
        };

        let line_subtotal = unit_price.multiply_quantity(quantity);
        let summary = &mut reconciliation.summary;
        summary.total += line_subtotal;
        summary.count += quantity;
        summary.items.push(CartLine {
            product_id,
            title: product.title.clone(),
            unit_price,
            quantity,
            line_subtotal,
            image: product.image.clone().unwrap_or_default(),
        });
    }

    reconciliation
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, price: &str) -> Product {
        Product {
            id,
            title: format!("Product {id}"),
            description: None,
            price: price.to_string(),
            currency: "USD".to_string(),
            image: Some(format!("/static/img/{id}.jpg")),
            category: None,
            rating: None,
        }
    }

    fn cart_of(entries: &[(ProductId, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (id, qty) in entries {
            cart.add(*id, *qty).unwrap();
        }
        cart
    }

    #[test]
    fn test_single_line_summary() {
        let cart = cart_of(&[(7, 2)]);
        let catalog = CatalogSnapshot::from_products([product(7, "10.00")]);

        let result = summarize(&cart, &catalog);

        let json = serde_json::to_value(&result.summary).unwrap();
        assert_eq!(json["items"][0]["productId"], 7);
        assert_eq!(json["items"][0]["quantity"], 2);
        assert_eq!(json["items"][0]["lineSubtotal"], "20.00");
        assert_eq!(json["total"], "20.00");
        assert_eq!(json["count"], 2);
        assert!(result.dropped.is_empty());
    }

    #[test]
    fn test_missing_product_is_dropped() {
        let cart = cart_of(&[(1, 1), (2, 3)]);
        let catalog = CatalogSnapshot::from_products([product(1, "4.50")]);

        let result = summarize(&cart, &catalog);

        assert_eq!(result.summary.items.len(), 1);
        assert_eq!(result.summary.total, Money::from_cents(450));
        assert_eq!(result.summary.count, 1);
        assert_eq!(result.dropped, vec![2]);
        assert!(result.has_dropped());
    }

    #[test]
    fn test_bad_price_counts_as_zero() {
        let cart = cart_of(&[(3, 2), (4, 1)]);
        let catalog = CatalogSnapshot::from_products([product(3, "abc"), product(4, "1.25")]);

        let result = summarize(&cart, &catalog);

        assert_eq!(result.summary.items[0].unit_price, Money::zero());
        assert_eq!(result.summary.items[0].line_subtotal, Money::zero());
        assert_eq!(result.summary.total, Money::from_cents(125));
        assert_eq!(result.summary.count, 3);
        assert_eq!(result.unpriced, vec![3]);
    }

    #[test]
    fn test_negative_price_counts_as_unpriced() {
        let cart = cart_of(&[(3, 1), (4, 2)]);
        let catalog = CatalogSnapshot::from_products([product(3, "-3.10"), product(4, "1.00")]);

        let result = summarize(&cart, &catalog);

        assert_eq!(result.summary.items[0].unit_price, Money::zero());
        assert_eq!(result.summary.total, Money::from_cents(200));
        assert_eq!(result.unpriced, vec![3]);
    }

    #[test]
    fn test_huge_prices_do_not_overflow_total() {
        let cart = cart_of(&[(1, 999), (2, 999)]);
        let catalog = CatalogSnapshot::from_products([
            product(1, "92233720368547758.07"),
            product(2, "92233720368547758.07"),
        ]);

        let result = summarize(&cart, &catalog);

        assert_eq!(result.summary.items.len(), 2);
        assert_eq!(result.summary.total, Money::from_cents(i64::MAX));
        assert_eq!(result.summary.count, 1998);
    }

    #[test]
    fn test_total_matches_line_sum() {
        let cart = cart_of(&[(1, 3), (2, 1), (5, 7)]);
        let catalog = CatalogSnapshot::from_products([
            product(1, "0.10"),
            product(2, "0.20"),
            product(5, "19.99"),
        ]);

        let summary = summarize(&cart, &catalog).summary;
        let expected: Money = summary
            .items
            .iter()
            .map(|line| line.unit_price * line.quantity)
            .sum();

        assert_eq!(summary.total, expected);
        assert_eq!(summary.total, Money::from_cents(30 + 20 + 13993));
        let ids: Vec<_> = summary.items.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![1, 2, 5]);
    }

    #[test]
    fn test_empty_cart() {
        let result = summarize(&Cart::new(), &CatalogSnapshot::default());
        assert!(result.summary.items.is_empty());
        assert_eq!(result.summary.total, Money::zero());
        assert_eq!(result.summary.count, 0);
    }

    #[test]
    fn test_missing_image_serializes_empty() {
        let mut p = product(1, "1.00");
        p.image = None;
        let result = summarize(&cart_of(&[(1, 1)]), &CatalogSnapshot::from_products([p]));
        assert_eq!(result.summary.items[0].image, "");
    }
}
