//! # Client Configuration
//!
//! Where the marketplace services live and how long reads may be cached.
//! Loaded from environment variables or a TOML file.

use rent_core::RentError;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_item_ttl() -> u64 {
    60
}

fn default_category_ttl() -> u64 {
    300
}

fn default_rental_ttl() -> u64 {
    60
}

/// Marketplace client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL shared by all services (gateway prefix included)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File that keeps the session token across restarts
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    #[serde(default = "default_item_ttl")]
    pub item_cache_ttl_secs: u64,

    #[serde(default = "default_category_ttl")]
    pub category_cache_ttl_secs: u64,

    #[serde(default = "default_rental_ttl")]
    pub rental_cache_ttl_secs: u64,

    /// Send `Idempotency-Key` on rental creation. Off unless the rental
    /// service is known to deduplicate on it.
    #[serde(default)]
    pub idempotency_keys: bool,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Recognised env vars (all optional):
    /// - `RENT_API_BASE_URL`
    /// - `RENT_TIMEOUT_SECS`
    /// - `RENT_TOKEN_PATH`
    /// - `RENT_IDEMPOTENCY_KEYS`
    pub fn from_env() -> Result<Self, RentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mut config = Self::default();

        if let Ok(url) = env::var("RENT_API_BASE_URL") {
            config.api_base_url = url;
        }

        if let Ok(timeout) = env::var("RENT_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                RentError::Configuration(format!("RENT_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
        }

        if let Ok(path) = env::var("RENT_TOKEN_PATH") {
            config.token_path = Some(PathBuf::from(path));
        }

        if let Ok(flag) = env::var("RENT_IDEMPOTENCY_KEYS") {
            config.idempotency_keys = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config.validate()
    }

    /// Load configuration from a TOML document
    pub fn from_toml(toml_str: &str) -> Result<Self, RentError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| RentError::Configuration(format!("Invalid client config: {}", e)))?;
        config.validate()
    }

    /// Normalise and check the loaded values
    pub fn validate(mut self) -> Result<Self, RentError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(RentError::Configuration(format!(
                "api_base_url must start with http:// or https://, got {}",
                self.api_base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(RentError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let trimmed = self.api_base_url.trim_end_matches('/').to_string();
        self.api_base_url = trimmed;
        Ok(self)
    }

    /// Builder: point at a different base URL (tests, staging)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: persist the session token in a file
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Builder: enable `Idempotency-Key` on rental creation
    pub fn with_idempotency_keys(mut self, enabled: bool) -> Self {
        self.idempotency_keys = enabled;
        self
    }

    /// Absolute URL for a service path such as `/rentals/`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn item_ttl(&self) -> Duration {
        Duration::from_secs(self.item_cache_ttl_secs)
    }

    pub fn category_ttl(&self) -> Duration {
        Duration::from_secs(self.category_cache_ttl_secs)
    }

    pub fn rental_ttl(&self) -> Duration {
        Duration::from_secs(self.rental_cache_ttl_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            token_path: None,
            item_cache_ttl_secs: default_item_ttl(),
            category_cache_ttl_secs: default_category_ttl(),
            rental_cache_ttl_secs: default_rental_ttl(),
            idempotency_keys: false,
        }
    }
}
