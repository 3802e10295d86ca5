//! # Services
//!
//! Request-independent workflows the route handlers delegate to.
//!
//! - [`cart`] - session cart load / mutate / reconcile
//! - [`checkout`] - create → capture payment orchestration

pub mod cart;
pub mod checkout;
