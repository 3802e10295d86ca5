//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Route handler / service                                               │
//! │       │                                                                 │
//! │       │  state.db.products().get_many(&ids)                            │
//! │       ▼                                                                 │
//! │  ProductRepository                  OrderRepository                    │
//! │  ├── get_by_id(id)                  ├── insert(new_order)              │
//! │  ├── get_many(ids)                  ├── find_by_external_id(id)        │
//! │  ├── list(filter)                   └── get_by_id(id)                  │
//! │  └── insert / delete                                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads and listing
//! - [`OrderRepository`](order::OrderRepository) - Captured order persistence

pub mod order;
pub mod product;
