//! # Storefront API Library
//!
//! HTTP server for the storefront: session carts, checkout and catalog
//! browsing.
//!
//! ## Module Organization
//! ```text
//! storefront_api/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── config.rs       ◄─── TOML + environment configuration
//! ├── state.rs        ◄─── Shared handles (db, sessions, processor)
//! ├── session.rs      ◄─── Cart storage (Redis / memory, CAS)
//! ├── extract.rs      ◄─── Session cookie, JSON-or-form bodies
//! ├── services/
//! │   ├── cart.rs     ◄─── Mutate + reconcile session carts
//! │   └── checkout.rs ◄─── Create → capture orchestration
//! ├── routes/
//! │   ├── cart.rs     ◄─── /api/cart, /cart/add, ...
//! │   ├── checkout.rs ◄─── /api/payments/orders, ...
//! │   └── product.rs  ◄─── /api/products
//! └── error.rs        ◄─── ApiError → JSON error body
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::StorefrontConfig;
use session::{MemorySessionStore, RedisSessionStore, SessionStore};
use state::AppState;
use storefront_db::{Database, DbConfig};
use storefront_payments::{PayPalClient, PaymentProcessor, UnconfiguredProcessor};

pub use routes::router;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront=trace` - Show trace for storefront crates only
/// - Default: `info,storefront=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Connects every collaborator described by `config`.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. SQLite pool + embedded migrations                                   │
/// │  2. Session store: Redis when configured and reachable, else memory     │
/// │  3. Payment processor: PayPal when credentials exist, else disabled     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn build_state(config: StorefrontConfig) -> anyhow::Result<AppState> {
    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await?;
    info!("Database connected and migrations applied");

    let sessions = connect_sessions(&config).await;
    let processor = connect_processor(&config)?;

    Ok(AppState::new(db, sessions, processor, config))
}

async fn connect_sessions(config: &StorefrontConfig) -> Arc<dyn SessionStore> {
    let session = &config.session;

    if let Some(url) = session.redis_url.as_deref() {
        match RedisSessionStore::connect(url, &session.key_prefix, session.ttl()).await {
            Ok(store) => return Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis, keeping carts in memory");
            }
        }
    } else {
        info!("No REDIS_URL configured, keeping carts in memory");
    }

    Arc::new(MemorySessionStore::new(session.ttl()))
}

fn connect_processor(config: &StorefrontConfig) -> anyhow::Result<Arc<dyn PaymentProcessor>> {
    match config.payments.paypal() {
        Some(paypal) => Ok(Arc::new(PayPalClient::new(paypal)?)),
        None => {
            warn!("PayPal credentials missing, checkout is disabled");
            Ok(Arc::new(UnconfiguredProcessor))
        }
    }
}
