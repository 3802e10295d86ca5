//! # Validation Module
//!
//! Input coercion and validation for the storefront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (axum extractor)                                   │
//! │  ├── JSON body or form body, fields arrive as Loose values             │
//! │  └── 5, 5.0, "5" are all accepted shapes                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Coerce Loose → typed ids and quantities                           │
//! │  └── Business rules: quantity caps, buyer identity, paging bounds      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── UNIQUE external payment order id                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed input fails with a [`ValidationError`]; nothing is silently
//! defaulted except an omitted add quantity.
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{parse_product_id, validate_quantity, Loose};
//!
//! let id = parse_product_id(Some(&Loose::Text("7".to_string()))).unwrap();
//! assert_eq!(id, 7);
//! assert!(validate_quantity(5).is_ok());
//! ```

use serde::Deserialize;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BuyerIdentity, ProductFilter, ProductId, ProductSort};
use crate::{DEFAULT_PAGE_SIZE, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Loose Transport Values
// =============================================================================

/// A scalar as it arrives from a JSON body or a form field.
///
/// JSON clients send numbers, older form posts send strings. Both are
/// accepted and coerced by the `parse_*` functions below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Coerces a loose value into an integer.
///
/// ## Rules
/// - JSON integers pass through
/// - JSON floats must be integral (`2.0` yes, `2.5` no)
/// - Strings must parse as a base-10 integer after trimming
pub fn coerce_integer(field: &str, value: &Loose) -> ValidationResult<i64> {
    let not_integer = || ValidationError::invalid(field, "must be an integer");

    match value {
        Loose::Int(n) => Ok(*n),
        Loose::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Ok(*f as i64)
            } else {
                Err(not_integer())
            }
        }
        Loose::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ValidationError::required(field));
            }
            text.parse::<i64>().map_err(|_| not_integer())
        }
    }
}

/// Parses a required product id.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::{parse_product_id, Loose};
///
/// assert!(parse_product_id(Some(&Loose::Text("abc".to_string()))).is_err());
/// assert!(parse_product_id(None).is_err());
/// ```
pub fn parse_product_id(value: Option<&Loose>) -> ValidationResult<ProductId> {
    let value = value.ok_or_else(|| ValidationError::required("productId"))?;
    let id = coerce_integer("productId", value)?;
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "productId".to_string(),
        });
    }
    Ok(id)
}

/// Parses a required quantity. Zero and negatives are returned as-is;
/// whether they are meaningful depends on the operation.
pub fn parse_quantity(value: Option<&Loose>) -> ValidationResult<i64> {
    let value = value.ok_or_else(|| ValidationError::required("qty"))?;
    coerce_integer("qty", value)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Shopper picks quantity: 5                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Proceed with Cart::add                                  │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates cart size (number of unique items) before adding a new entry.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates an ISO 4217 style currency code (three uppercase letters).
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::invalid(
            "currency",
            "must be a three-letter uppercase code",
        ));
    }
    Ok(())
}

// =============================================================================
// Buyer Identity
// =============================================================================

fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::required(field));
    }
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates an email address shape: one `@`, non-empty local part, a dot in
/// the domain, no whitespace.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_length("email", email, 3, 200)?;

    let malformed = || ValidationError::invalid("email", "must be a valid email address");
    if email.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.contains('@') {
        return Err(malformed());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(malformed()),
    }
}

/// Validates and trims the buyer identity entered on the checkout form.
///
/// ## Rules
/// - fullname: 2-200 characters
/// - email: valid shape, at most 200 characters
/// - address: 5-400 characters
pub fn validate_buyer(buyer: &BuyerIdentity) -> ValidationResult<BuyerIdentity> {
    let fullname = buyer.fullname.trim();
    let email = buyer.email.trim();
    let address = buyer.address.trim();

    validate_length("fullname", fullname, 2, 200)?;
    validate_email(email)?;
    validate_length("address", address, 5, 400)?;

    Ok(BuyerIdentity {
        fullname: fullname.to_string(),
        email: email.to_string(),
        address: address.to_string(),
    })
}

/// Validates a payment processor order id taken from the request path.
///
/// ## Rules
/// - 1-64 characters
/// - ASCII letters, digits and `-` only
pub fn validate_payment_order_id(order_id: &str) -> ValidationResult<()> {
    if order_id.is_empty() {
        return Err(ValidationError::required("orderId"));
    }
    validate_length("orderId", order_id, 1, 64)?;

    if !order_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(ValidationError::invalid(
            "orderId",
            "only letters, digits and '-' are allowed",
        ));
    }
    Ok(())
}

// =============================================================================
// Catalog Query
// =============================================================================

/// Raw catalog listing parameters, straight from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub sort: Option<String>,
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no text filter)
/// - Maximum 100 characters
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "q".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bounded(field: &str, value: Option<&str>, default: u32, max: u32) -> ValidationResult<u32> {
    let Some(text) = value else {
        return Ok(default);
    };
    let n: i64 = text
        .parse()
        .map_err(|_| ValidationError::invalid(field, "must be an integer"))?;
    if n < 1 || n > i64::from(max) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(max),
        });
    }
    Ok(n as u32)
}

fn parse_price_bound(field: &str, value: Option<&str>) -> ValidationResult<Option<Money>> {
    value
        .map(|text| {
            Money::parse_decimal(text)
                .map_err(|_| ValidationError::invalid(field, "must be a decimal amount"))
        })
        .transpose()
}

/// Turns raw listing parameters into a validated [`ProductFilter`].
///
/// ## Rules
/// - `page` ≥ 1 (default 1)
/// - `per_page` 1..=100 (default 9)
/// - `price_min` / `price_max` are decimal amounts; min must not exceed max
/// - `sort` is `price_asc`, `price_desc`, anything else means newest first
pub fn build_product_filter(query: &ProductQuery) -> ValidationResult<ProductFilter> {
    let page = parse_bounded("page", non_empty(&query.page), 1, u32::MAX)?;
    let per_page = parse_bounded(
        "per_page",
        non_empty(&query.per_page),
        DEFAULT_PAGE_SIZE,
        MAX_PAGE_SIZE,
    )?;

    let text = match non_empty(&query.q) {
        Some(q) => Some(validate_search_query(q)?),
        None => None,
    };

    let price_min = parse_price_bound("price_min", non_empty(&query.price_min))?;
    let price_max = parse_price_bound("price_max", non_empty(&query.price_max))?;
    if let (Some(min), Some(max)) = (price_min, price_max) {
        if min > max {
            return Err(ValidationError::invalid(
                "price_min",
                "must not exceed price_max",
            ));
        }
    }

    Ok(ProductFilter {
        query: text,
        category: non_empty(&query.category).map(str::to_string),
        price_min,
        price_max,
        sort: ProductSort::from_param(query.sort.as_deref()),
        page,
        per_page,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Loose {
        Loose::Text(s.to_string())
    }

    #[test]
    fn test_coerce_integer_shapes() {
        assert_eq!(coerce_integer("qty", &Loose::Int(3)).unwrap(), 3);
        assert_eq!(coerce_integer("qty", &Loose::Float(2.0)).unwrap(), 2);
        assert_eq!(coerce_integer("qty", &text(" 4 ")).unwrap(), 4);
        assert_eq!(coerce_integer("qty", &text("-1")).unwrap(), -1);

        assert!(coerce_integer("qty", &Loose::Float(2.5)).is_err());
        assert!(coerce_integer("qty", &Loose::Float(f64::NAN)).is_err());
        assert!(coerce_integer("qty", &text("2.0")).is_err());
        assert!(coerce_integer("qty", &text("abc")).is_err());
    }

    #[test]
    fn test_loose_deserializes_json_and_form_values() {
        let values: Vec<Loose> = serde_json::from_str(r#"[7, 2.0, "9"]"#).unwrap();
        assert_eq!(values, vec![Loose::Int(7), Loose::Float(2.0), text("9")]);
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id(Some(&Loose::Int(7))).unwrap(), 7);
        assert_eq!(parse_product_id(Some(&text("12"))).unwrap(), 12);

        assert!(matches!(
            parse_product_id(None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_product_id(Some(&text("abc"))),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_product_id(Some(&Loose::Int(0))),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            parse_product_id(Some(&text(""))),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_parse_quantity_allows_non_positive() {
        assert_eq!(parse_quantity(Some(&Loose::Int(0))).unwrap(), 0);
        assert_eq!(parse_quantity(Some(&text("-3"))).unwrap(), -3);
        assert!(parse_quantity(None).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(99).is_ok());
        assert!(validate_cart_size(100).is_err());
    }

    #[test]
    fn test_validate_currency_code() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("US").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada example@x.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_buyer_trims_and_checks_lengths() {
        let buyer = BuyerIdentity {
            fullname: "  Ada Lovelace ".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Row".to_string(),
        };
        let clean = validate_buyer(&buyer).unwrap();
        assert_eq!(clean.fullname, "Ada Lovelace");

        let short_name = BuyerIdentity {
            fullname: "A".to_string(),
            ..buyer.clone()
        };
        assert!(matches!(
            validate_buyer(&short_name),
            Err(ValidationError::TooShort { .. })
        ));

        let short_address = BuyerIdentity {
            address: "x".to_string(),
            ..buyer
        };
        assert!(validate_buyer(&short_address).is_err());
    }

    #[test]
    fn test_build_product_filter_defaults() {
        let filter = build_product_filter(&ProductQuery::default()).unwrap();
        assert_eq!(filter, ProductFilter::default());
        assert_eq!(filter.per_page, 9);
    }

    #[test]
    fn test_build_product_filter_parses_everything() {
        let query = ProductQuery {
            page: Some("2".to_string()),
            per_page: Some("20".to_string()),
            q: Some(" lamp ".to_string()),
            category: Some("home".to_string()),
            price_min: Some("5".to_string()),
            price_max: Some("50.00".to_string()),
            sort: Some("price_desc".to_string()),
        };
        let filter = build_product_filter(&query).unwrap();
        assert_eq!(filter.page, 2);
        assert_eq!(filter.per_page, 20);
        assert_eq!(filter.query.as_deref(), Some("lamp"));
        assert_eq!(filter.category.as_deref(), Some("home"));
        assert_eq!(filter.price_min, Some(Money::from_cents(500)));
        assert_eq!(filter.price_max, Some(Money::from_cents(5000)));
        assert_eq!(filter.sort, ProductSort::PriceDesc);
    }

    #[test]
    fn test_build_product_filter_rejects_bad_values() {
        let bad_page = ProductQuery {
            page: Some("0".to_string()),
            ..ProductQuery::default()
        };
        assert!(build_product_filter(&bad_page).is_err());

        let bad_size = ProductQuery {
            per_page: Some("500".to_string()),
            ..ProductQuery::default()
        };
        assert!(build_product_filter(&bad_size).is_err());

        let bad_price = ProductQuery {
            price_min: Some("cheap".to_string()),
            ..ProductQuery::default()
        };
        assert!(build_product_filter(&bad_price).is_err());

        let inverted = ProductQuery {
            price_min: Some("10".to_string()),
            price_max: Some("5".to_string()),
            ..ProductQuery::default()
        };
        assert!(build_product_filter(&inverted).is_err());
    }

    #[test]
    fn test_validate_payment_order_id() {
        assert!(validate_payment_order_id("5O190127TN364715T").is_ok());
        assert!(validate_payment_order_id("PAY-1").is_ok());

        assert!(matches!(
            validate_payment_order_id(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_payment_order_id("X/../../v1/payments/payouts?").is_err());
        assert!(validate_payment_order_id("abc%2F").is_err());
        assert!(validate_payment_order_id("a b").is_err());
        assert!(validate_payment_order_id(&"A".repeat(65)).is_err());
    }
}
