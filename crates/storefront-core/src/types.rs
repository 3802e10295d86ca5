//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  PurchaseUnit   │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  reference_id   │   │  id (i64)       │       │
//! │  │  title          │   │  amount         │   │  buyer identity │       │
//! │  │  price (TEXT)   │   │   currency_code │   │  total_amount   │       │
//! │  │  currency       │   │   value         │   │  external id    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ProductFilter   │   │     Page<T>     │   │ BuyerIdentity   │       │
//! │  │  q, category    │   │  items, total   │   │  fullname       │       │
//! │  │  price range    │   │  page, per_page │   │  email, address │       │
//! │  │  sort, paging   │   │                 │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products are owned by the catalog (admin panel); the storefront only reads
//! them. Orders are written once per successful capture and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

/// Catalog identifier of a product.
pub type ProductId = i64;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale, as stored in the catalog.
///
/// ## Price Storage
/// The catalog keeps `price` as decimal text (the admin panel writes it
/// verbatim). It is parsed into [`Money`] on every read through
/// [`Product::unit_price`]; nothing caches the parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    /// Decimal text, e.g. `"10.00"`.
    pub price: String,
    pub currency: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f64>,
}

impl Product {
    /// Parses the stored price. Catalog prices are never negative.
    pub fn unit_price(&self) -> Result<Money, ValidationError> {
        let price = Money::parse_decimal(&self.price)?;
        if price.is_negative() {
            return Err(ValidationError::invalid("price", "must not be negative"));
        }
        Ok(price)
    }
}

// =============================================================================
// Catalog Browsing
// =============================================================================

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Highest id first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Maps the `sort` query parameter. Unknown values fall back to newest.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            _ => ProductSort::Newest,
        }
    }
}

/// Validated catalog listing filter.
///
/// Build it with [`crate::validation::build_product_filter`] so paging bounds
/// and price ranges are already checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring matched against title or description.
    pub query: Option<String>,
    pub category: Option<String>,
    /// Inclusive lower bound.
    pub price_min: Option<Money>,
    /// Inclusive upper bound.
    pub price_max: Option<Money>,
    pub sort: ProductSort,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            query: None,
            category: None,
            price_min: None,
            price_max: None,
            sort: ProductSort::Newest,
            page: 1,
            per_page: crate::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductFilter {
    /// Row offset of the first item on the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows across all pages.
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Number of pages, `ceil(total / per_page)`.
    pub fn pages(&self) -> i64 {
        if self.per_page == 0 {
            return 0;
        }
        let per_page = i64::from(self.per_page);
        (self.total + per_page - 1) / per_page
    }
}

// =============================================================================
// Purchase Units
// =============================================================================

/// Amount as exchanged with the payment processor.
///
/// Kept as text on the wire; convert with [`Amount::to_money`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency_code: String,
    pub value: String,
}

impl Amount {
    /// Builds a wire amount from typed money.
    pub fn new(currency_code: impl Into<String>, value: Money) -> Self {
        Self {
            currency_code: currency_code.into(),
            value: value.to_string(),
        }
    }

    /// Parses the decimal value.
    pub fn to_money(&self) -> Result<Money, ValidationError> {
        Money::parse_decimal(&self.value)
    }
}

/// A client-declared purchase unit, forwarded to the processor's create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub amount: Amount,
}

// =============================================================================
// Orders
// =============================================================================

/// Who paid. Either entered on the checkout form or the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentity {
    pub fullname: String,
    pub email: String,
    pub address: String,
}

impl BuyerIdentity {
    /// Identity recorded when the payer skipped the checkout form.
    pub fn placeholder() -> Self {
        Self {
            fullname: "PayPal Customer".to_string(),
            email: "paypal@example.com".to_string(),
            address: "Paid via PayPal".to_string(),
        }
    }
}

/// A confirmed, permanent order record.
///
/// `total_amount` is always the processor-confirmed captured amount, never a
/// client-declared value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub fullname: String,
    pub email: String,
    pub address: String,
    pub total_amount: Money,
    pub currency: String,
    pub external_payment_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an order. The database assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub buyer: BuyerIdentity,
    pub total_amount: Money,
    pub currency: String,
    pub external_payment_order_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: &str) -> Product {
        Product {
            id: 7,
            title: "Lamp".to_string(),
            description: None,
            price: price.to_string(),
            currency: "USD".to_string(),
            image: None,
            category: None,
            rating: None,
        }
    }

    #[test]
    fn test_unit_price_parses_catalog_text() {
        assert_eq!(product("10.00").unit_price().unwrap(), Money::from_cents(1000));
        assert!(product("abc").unit_price().is_err());
        assert!(product("-3.10").unit_price().is_err());
        assert_eq!(product("0.00").unit_price().unwrap(), Money::zero());
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page: Page<()> = Page {
            items: vec![],
            total: 19,
            page: 1,
            per_page: 9,
        };
        assert_eq!(page.pages(), 3);

        let empty: Page<()> = Page {
            items: vec![],
            total: 0,
            page: 1,
            per_page: 9,
        };
        assert_eq!(empty.pages(), 0);
    }

    #[test]
    fn test_filter_offset() {
        let filter = ProductFilter {
            page: 3,
            per_page: 9,
            ..ProductFilter::default()
        };
        assert_eq!(filter.offset(), 18);
    }

    #[test]
    fn test_sort_param() {
        assert_eq!(ProductSort::from_param(Some("price_asc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::from_param(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_param(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_param(None), ProductSort::Newest);
    }

    #[test]
    fn test_purchase_unit_wire_format() {
        let json = r#"{"amount":{"currency_code":"USD","value":"20.00"}}"#;
        let unit: PurchaseUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.amount.to_money().unwrap(), Money::from_cents(2000));
        assert_eq!(serde_json::to_string(&unit).unwrap(), json);
    }

    #[test]
    fn test_order_serializes_camel_case() {
        let order = Order {
            id: 1,
            fullname: "PayPal Customer".to_string(),
            email: "paypal@example.com".to_string(),
            address: "Paid via PayPal".to_string(),
            total_amount: Money::from_cents(4500),
            currency: "USD".to_string(),
            external_payment_order_id: Some("5O190127TN364715T".to_string()),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["totalAmount"], "45.00");
        assert_eq!(value["externalPaymentOrderId"], "5O190127TN364715T");
    }
}
