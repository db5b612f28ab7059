//! # CLI Setup
//!
//! Loads the client configuration and the payment processor.

use async_trait::async_trait;
use rent_client::ClientConfig;
use rent_core::{
    BoxedPaymentProcessor, ConfirmationOutcome, HandshakeSecret, PaymentMethodDetails,
    PaymentProcessor, RentError, RentResult,
};
use rent_stripe::StripeProcessor;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const CONFIG_PATHS: [&str; 3] = [
    "config/client.toml",
    "../config/client.toml",
    "../../config/client.toml",
];

/// Load client config from an explicit file, the first default path that
/// exists, or the environment.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<ClientConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config = ClientConfig::from_toml(&content)?;
        info!("Loaded client config from {}", path.display());
        return Ok(config);
    }

    for path in CONFIG_PATHS {
        if let Ok(content) = std::fs::read_to_string(path) {
            let config = ClientConfig::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            info!("Loaded client config from {}", path);
            return Ok(config);
        }
    }

    Ok(ClientConfig::from_env()?)
}

/// Stripe when configured; otherwise a processor that refuses to confirm so
/// commands that never pay still work.
pub fn load_processor() -> BoxedPaymentProcessor {
    match StripeProcessor::from_env() {
        Ok(processor) => {
            if processor.config().is_test_mode() {
                info!("Stripe processor in test mode");
            }
            Arc::new(processor)
        }
        Err(e) => {
            warn!("Payments disabled: {}", e);
            Arc::new(Unconfigured(e))
        }
    }
}

/// Stands in when no processor is configured; every confirmation fails
pub(crate) struct Unconfigured(pub(crate) RentError);

#[async_trait]
impl PaymentProcessor for Unconfigured {
    async fn confirm(
        &self,
        _secret: &HandshakeSecret,
        _details: &PaymentMethodDetails,
    ) -> RentResult<ConfirmationOutcome> {
        Err(self.0.clone())
    }

    fn processor_name(&self) -> &'static str {
        "unconfigured"
    }
}
