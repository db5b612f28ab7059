//! # Stripe Configuration
//!
//! Client-side Stripe settings. Only the publishable key is needed: the
//! secret key stays with the payment service that mints intents.

use rent_core::RentError;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Publishable key (pk_test_... or pk_live_...)
    pub publishable_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Where the processor sends the user back after a redirect step
    pub return_url: Option<String>,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_PUBLISHABLE_KEY`
    ///
    /// Optional:
    /// - `STRIPE_RETURN_URL`
    pub fn from_env() -> Result<Self, RentError> {
        dotenvy::dotenv().ok();

        let publishable_key = env::var("STRIPE_PUBLISHABLE_KEY").map_err(|_| {
            RentError::Configuration("STRIPE_PUBLISHABLE_KEY not set".to_string())
        })?;

        let mut config = Self::new(publishable_key)?;
        config.return_url = env::var("STRIPE_RETURN_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        Ok(config)
    }

    /// Create config with an explicit key
    pub fn new(publishable_key: impl Into<String>) -> Result<Self, RentError> {
        let publishable_key = publishable_key.into();

        if !publishable_key.starts_with("pk_test_") && !publishable_key.starts_with("pk_live_") {
            return Err(RentError::Configuration(
                "STRIPE_PUBLISHABLE_KEY must start with pk_test_ or pk_live_".to_string(),
            ));
        }

        Ok(Self {
            publishable_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            return_url: None,
        })
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.publishable_key.starts_with("pk_test_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.publishable_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set the redirect return URL
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }
}
