//! # Session Cart Storage
//!
//! Stores one [`Cart`] per anonymous session token, with a version number for
//! optimistic concurrency.
//!
//! ## Compare-And-Swap Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Write (per request)                             │
//! │                                                                         │
//! │  load(token) ──► VersionedCart { cart, version: 4 }                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mutate a local copy (storefront-core Cart)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compare_and_swap(token, expected: 4, cart)                            │
//! │       │                                                                 │
//! │       ├── stored version still 4 ──► write cart, version = 5 ──► true  │
//! │       │                                                                 │
//! │       └── someone wrote first ─────► nothing written ──────────► false │
//! │                                       (caller reloads and retries)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Version 0 means "no cart stored". Each cart is written as one value, so a
//! reader never observes a partial write.
//!
//! ## Backends
//! - [`MemorySessionStore`] - process-local, used when no Redis is configured
//!   and in tests
//! - [`RedisSessionStore`] - one hash per session (`version`, `cart`), CAS in
//!   a Lua script, idle expiry via `EXPIRE`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use storefront_core::Cart;

// =============================================================================
// Errors
// =============================================================================

/// Session storage errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store could not be reached or answered with an error.
    #[error("Session store error: {0}")]
    Backend(String),

    /// A cart could not be encoded for storage.
    #[error("Session serialization error: {0}")]
    Serialization(String),

    /// Concurrent writers kept winning the compare-and-swap.
    #[error("Cart was modified concurrently, please retry")]
    Contention,
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Backend(err.to_string())
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Store Trait
// =============================================================================

/// A cart together with the version it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedCart {
    pub cart: Cart,
    pub version: u64,
}

/// Session-scoped cart storage with optimistic concurrency.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the cart for a session. Unknown or expired sessions load as an
    /// empty cart at version 0.
    async fn load(&self, token: &str) -> SessionResult<VersionedCart>;

    /// Writes `cart` only if the stored version still equals
    /// `expected_version`. Returns whether the write happened.
    async fn compare_and_swap(
        &self,
        token: &str,
        expected_version: u64,
        cart: &Cart,
    ) -> SessionResult<bool>;

    /// Forgets a session entirely.
    async fn remove(&self, token: &str) -> SessionResult<()>;
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug, Clone)]
struct StoredCart {
    cart: Cart,
    version: u64,
    expires_at: Instant,
}

/// Process-local session store.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, StoredCart>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> SessionResult<VersionedCart> {
        let entries = self.entries.read().await;
        match entries.get(token) {
            Some(stored) if stored.expires_at > Instant::now() => Ok(VersionedCart {
                cart: stored.cart.clone(),
                version: stored.version,
            }),
            _ => Ok(VersionedCart::default()),
        }
    }

    async fn compare_and_swap(
        &self,
        token: &str,
        expected_version: u64,
        cart: &Cart,
    ) -> SessionResult<bool> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        // Expired sessions behave as absent (version 0)
        let current = entries
            .get(token)
            .filter(|e| e.expires_at > now)
            .map(|e| e.version)
            .unwrap_or(0);

        if current != expected_version {
            debug!(current, expected_version, "Session CAS lost");
            return Ok(false);
        }

        entries.insert(
            token.to_string(),
            StoredCart {
                cart: cart.clone(),
                version: current + 1,
                expires_at: now + self.ttl,
            },
        );

        // Sweep expired sessions while holding the write lock
        entries.retain(|_, e| e.expires_at > now);
        Ok(true)
    }

    async fn remove(&self, token: &str) -> SessionResult<()> {
        self.entries.write().await.remove(token);
        Ok(())
    }
}

// =============================================================================
// Redis Store
// =============================================================================

/// KEYS[1] = cart hash, ARGV = expected version, encoded cart, ttl seconds.
const CAS_SCRIPT: &str = r#"
local current = tonumber(redis.call('HGET', KEYS[1], 'version') or '0')
if current ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('HSET', KEYS[1], 'version', current + 1, 'cart', ARGV[2])
redis.call('EXPIRE', KEYS[1], ARGV[3])
return 1
"#;

/// Redis-backed session store shared by every server instance.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    key_prefix: String,
    ttl: Duration,
    cas: Arc<Script>,
}

impl RedisSessionStore {
    /// Connects to Redis. The connection manager reconnects on its own.
    pub async fn connect(url: &str, key_prefix: &str, ttl: Duration) -> SessionResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!(prefix = %key_prefix, "Connected to Redis session store");

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
            ttl,
            cas: Arc::new(Script::new(CAS_SCRIPT)),
        })
    }

    fn key(&self, token: &str) -> String {
        format!("{}:{}", self.key_prefix, token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> SessionResult<VersionedCart> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(self.key(token)).await?;

        let version = fields
            .get("version")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let cart = match fields.get("cart") {
            Some(raw) => serde_json::from_str::<Cart>(raw).unwrap_or_else(|e| {
                // Overwritten by the next successful write
                warn!(error = %e, "Discarding unreadable stored cart");
                Cart::new()
            }),
            None => Cart::new(),
        };

        Ok(VersionedCart { cart, version })
    }

    async fn compare_and_swap(
        &self,
        token: &str,
        expected_version: u64,
        cart: &Cart,
    ) -> SessionResult<bool> {
        let encoded =
            serde_json::to_string(cart).map_err(|e| SessionError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        let swapped: i64 = self
            .cas
            .key(self.key(token))
            .arg(expected_version)
            .arg(encoded)
            .arg(self.ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await?;

        Ok(swapped == 1)
    }

    async fn remove(&self, token: &str) -> SessionResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(self.key(token)).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemorySessionStore {
        MemorySessionStore::new(Duration::from_secs(60))
    }

    fn cart_with(id: i64, qty: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add(id, qty).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_unknown_session_loads_empty() {
        let loaded = store().load("nobody").await.unwrap();
        assert!(loaded.cart.is_empty());
        assert_eq!(loaded.version, 0);
    }

    #[tokio::test]
    async fn test_cas_bumps_version() {
        let store = store();
        assert!(store.compare_and_swap("t", 0, &cart_with(7, 2)).await.unwrap());

        let loaded = store.load("t").await.unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.cart.quantity(7), Some(2));
    }

    #[tokio::test]
    async fn test_stale_writer_loses() {
        let store = store();
        let first = store.load("t").await.unwrap();
        let second = store.load("t").await.unwrap();

        assert!(store
            .compare_and_swap("t", first.version, &cart_with(1, 1))
            .await
            .unwrap());
        assert!(!store
            .compare_and_swap("t", second.version, &cart_with(2, 1))
            .await
            .unwrap());

        let loaded = store.load("t").await.unwrap();
        assert_eq!(loaded.cart.product_ids(), vec![1]);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = store();
        store.compare_and_swap("a", 0, &cart_with(1, 1)).await.unwrap();
        store.compare_and_swap("b", 0, &cart_with(2, 5)).await.unwrap();

        assert_eq!(store.load("a").await.unwrap().cart.product_ids(), vec![1]);
        assert_eq!(store.load("b").await.unwrap().cart.quantity(2), Some(5));
        assert_eq!(store.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_expired_session_is_empty() {
        let store = MemorySessionStore::new(Duration::from_millis(20));
        store.compare_and_swap("t", 0, &cart_with(7, 1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        let loaded = store.load("t").await.unwrap();
        assert!(loaded.cart.is_empty());
        assert_eq!(loaded.version, 0);
        assert!(store.compare_and_swap("t", 0, &Cart::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_forgets_session() {
        let store = store();
        store.compare_and_swap("t", 0, &cart_with(7, 1)).await.unwrap();
        store.remove("t").await.unwrap();
        store.remove("t").await.unwrap();

        assert_eq!(store.load("t").await.unwrap(), VersionedCart::default());
    }
}
