//! # Server Configuration
//!
//! Configuration is assembled once in `main` and shared through `AppState`.
//!
//! ## Load Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Configuration Layers                               │
//! │                                                                         │
//! │  1. Defaults            StorefrontConfig::default()                    │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  2. TOML file           $STOREFRONT_CONFIG or ./storefront.toml        │
//! │          │              (optional; missing file is fine)               │
//! │          ▼                                                              │
//! │  3. Environment         STOREFRONT_PORT, DATABASE_PATH, REDIS_URL,     │
//! │          │              PAYPAL_CLIENT_ID, ...                          │
//! │          ▼                                                              │
//! │  4. validate()          rejects values the server cannot run with      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example `storefront.toml`
//! ```toml
//! [server]
//! port = 8080
//!
//! [database]
//! path = "storefront.db"
//!
//! [session]
//! redis_url = "redis://127.0.0.1:6379"
//! ttl_secs = 604800
//!
//! [payments]
//! client_id = "..."
//! client_secret = "..."
//! base_url = "https://api-m.sandbox.paypal.com"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::validation::validate_currency_code;
use storefront_core::DEFAULT_CURRENCY;
use storefront_payments::{PayPalConfig, SANDBOX_BASE_URL};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the TCP listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storefront.db"),
            max_connections: 5,
        }
    }
}

/// Session cookie and cart storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Redis connection string. Carts are kept in memory when unset.
    pub redis_url: Option<String>,
    pub cookie_name: String,
    /// Idle lifetime of a cart, refreshed on every write.
    pub ttl_secs: u64,
    /// Redis key prefix for cart hashes.
    pub key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            cookie_name: "storefront_session".to_string(),
            ttl_secs: 7 * 24 * 60 * 60,
            key_prefix: "storefront:cart".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Payment processor credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: SANDBOX_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl PaymentsConfig {
    /// Client configuration, or `None` when credentials are missing.
    pub fn paypal(&self) -> Option<PayPalConfig> {
        let client_id = self.client_id.as_deref().filter(|s| !s.is_empty())?;
        let client_secret = self.client_secret.as_deref().filter(|s| !s.is_empty())?;

        Some(
            PayPalConfig::sandbox(client_id, client_secret)
                .with_base_url(self.base_url.clone())
                .with_timeout(Duration::from_secs(self.timeout_secs)),
        )
    }
}

/// Shop-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// The single currency every price and payment is in.
    pub currency: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

// =============================================================================
// StorefrontConfig
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub payments: PaymentsConfig,
    pub store: StoreConfig,
}

impl StorefrontConfig {
    /// Loads defaults, the optional TOML file, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Missing sections keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STOREFRONT_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("STOREFRONT_PORT") {
            self.server.port = parse_value("STOREFRONT_PORT", &v)?;
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("REDIS_URL") {
            self.session.redis_url = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("SESSION_TTL_SECS") {
            self.session.ttl_secs = parse_value("SESSION_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("PAYPAL_CLIENT_ID") {
            self.payments.client_id = Some(v);
        }
        if let Some(v) = lookup("PAYPAL_CLIENT_SECRET") {
            self.payments.client_secret = Some(v);
        }
        if let Some(v) = lookup("PAYPAL_BASE_URL") {
            self.payments.base_url = v;
        }
        if let Some(v) = lookup("PAYPAL_TIMEOUT_SECS") {
            self.payments.timeout_secs = parse_value("PAYPAL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("STOREFRONT_CURRENCY") {
            self.store.currency = v.to_uppercase();
        }
        Ok(())
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_currency_code(&self.store.currency)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid(format!(
                "session cookie name '{}' is not a valid token",
                self.session.cookie_name
            )));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::Invalid("session ttl must be positive".to_string()));
        }
        if self.payments.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "payment timeout must be positive".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database max_connections must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = StorefrontConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert_eq!(config.session.cookie_name, "storefront_session");
        assert_eq!(config.store.currency, "USD");
        assert!(config.payments.paypal().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StorefrontConfig::from_toml(
            r#"
            [server]
            port = 3000

            [payments]
            client_id = "id"
            client_secret = "secret"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("storefront.db"));

        let paypal = config.payments.paypal().unwrap();
        assert_eq!(paypal.client_id, "id");
        assert_eq!(paypal.timeout, Duration::from_secs(5));
        assert_eq!(paypal.base_url, SANDBOX_BASE_URL);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = StorefrontConfig::from_toml("[server]\nport = 3000").unwrap();
        config
            .apply_overrides(lookup(&[
                ("STOREFRONT_PORT", "9090"),
                ("REDIS_URL", "redis://cache:6379"),
                ("STOREFRONT_CURRENCY", "eur"),
                ("PAYPAL_TIMEOUT_SECS", "12"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.session.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.store.currency, "EUR");
        assert_eq!(config.payments.timeout_secs, 12);
    }

    #[test]
    fn test_bad_env_number_is_rejected() {
        let mut config = StorefrontConfig::default();
        let err = config
            .apply_overrides(lookup(&[("STOREFRONT_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_empty_redis_url_means_memory_store() {
        let mut config = StorefrontConfig::default();
        config.apply_overrides(lookup(&[("REDIS_URL", "")])).unwrap();
        assert!(config.session.redis_url.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StorefrontConfig::default();
        config.store.currency = "DOLLARS".to_string();
        assert!(config.validate().is_err());

        let mut config = StorefrontConfig::default();
        config.session.cookie_name = "bad name;".to_string();
        assert!(config.validate().is_err());

        let mut config = StorefrontConfig::default();
        config.payments.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_credentials_are_unconfigured() {
        let mut config = StorefrontConfig::default();
        config.payments.client_id = Some("id".to_string());
        config.payments.client_secret = Some(String::new());
        assert!(config.payments.paypal().is_none());
    }
}
