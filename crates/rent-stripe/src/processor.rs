//! # Stripe Payment Intent Confirmation
//!
//! Confirms a payment intent from the client side using the intent's client
//! secret and the publishable key, the same call Stripe.js makes.

use crate::config::StripeConfig;
use async_trait::async_trait;
use rent_core::{
    ConfirmationOutcome, HandshakeSecret, PaymentMethodDetails, PaymentProcessor, RentError,
    RentResult,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Stripe processor for rental deposits
pub struct StripeProcessor {
    config: StripeConfig,
    client: Client,
}

impl StripeProcessor {
    /// Create a new Stripe processor
    pub fn new(config: StripeConfig) -> RentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RentError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> RentResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form body for `POST /v1/payment_intents/{id}/confirm`
    fn confirm_params(
        &self,
        secret: &HandshakeSecret,
        details: &PaymentMethodDetails,
    ) -> Vec<(String, String)> {
        let mut params = vec![("client_secret".to_string(), secret.expose().to_string())];

        match details {
            PaymentMethodDetails::Existing(payment_method) => {
                params.push(("payment_method".to_string(), payment_method.clone()));
            }
            PaymentMethodDetails::Card(card) => {
                params.extend([
                    ("payment_method_data[type]".to_string(), "card".to_string()),
                    (
                        "payment_method_data[card][number]".to_string(),
                        card.number.clone(),
                    ),
                    (
                        "payment_method_data[card][exp_month]".to_string(),
                        card.exp_month.to_string(),
                    ),
                    (
                        "payment_method_data[card][exp_year]".to_string(),
                        card.exp_year.to_string(),
                    ),
                    ("payment_method_data[card][cvc]".to_string(), card.cvc.clone()),
                ]);
            }
        }

        if let Some(ref return_url) = self.config.return_url {
            params.push(("return_url".to_string(), return_url.clone()));
        }

        params
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    #[instrument(skip(self, secret, details), fields(intent = ?secret.intent_id()))]
    async fn confirm(
        &self,
        secret: &HandshakeSecret,
        details: &PaymentMethodDetails,
    ) -> RentResult<ConfirmationOutcome> {
        let intent_id = secret.intent_id().ok_or_else(|| {
            RentError::InvalidRequest("client secret does not name a payment intent".to_string())
        })?;

        let url = format!(
            "{}/v1/payment_intents/{}/confirm",
            self.config.api_base_url, intent_id
        );
        debug!("Confirming Stripe payment intent {}", intent_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&self.confirm_params(secret, details))
            .send()
            .await
            .map_err(|e| RentError::Transient {
                status: None,
                detail: format!("Could not reach the payment processor: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RentError::Transient {
            status: Some(status.as_u16()),
            detail: format!("Payment processor response was cut short: {}", e),
        })?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);
            return Err(map_error_response(status, &body));
        }

        let intent: StripePaymentIntent = serde_json::from_str(&body).map_err(|e| {
            RentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        let outcome = map_intent(intent)?;
        info!("Stripe confirmation: {:?}", outcome);
        Ok(outcome)
    }

    fn processor_name(&self) -> &'static str {
        "stripe"
    }
}

/// Translate a confirmed intent into an outcome or a decline
fn map_intent(intent: StripePaymentIntent) -> RentResult<ConfirmationOutcome> {
    match intent.status.as_str() {
        "succeeded" | "requires_capture" => {
            Ok(ConfirmationOutcome::Succeeded { intent_id: intent.id })
        }
        "processing" => Ok(ConfirmationOutcome::Processing { intent_id: intent.id }),
        "requires_action" => Ok(ConfirmationOutcome::RequiresAction {
            redirect_url: intent
                .next_action
                .and_then(|action| action.redirect_to_url)
                .and_then(|redirect| redirect.url),
            intent_id: intent.id,
        }),
        "requires_payment_method" => Err(match intent.last_payment_error {
            Some(err) => declined(err),
            None => RentError::ProcessorDeclined {
                reason: "The payment method was not accepted.".to_string(),
                code: None,
            },
        }),
        other => Err(RentError::ProcessorDeclined {
            reason: format!("Payment could not be completed (status: {})", other),
            code: Some(other.to_string()),
        }),
    }
}

fn declined(err: StripeError) -> RentError {
    RentError::ProcessorDeclined {
        reason: err
            .message
            .unwrap_or_else(|| "Your card was declined.".to_string()),
        code: err.decline_code.or(err.code),
    }
}

/// Card errors are declines; other client errors are rejected requests;
/// rate limits and server faults are transient.
fn map_error_response(status: StatusCode, body: &str) -> RentError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body)
        .ok()
        .map(|r| r.error);

    match parsed {
        Some(err) if err.error_type.as_deref() == Some("card_error") => declined(err),
        Some(err) => classify(status, err.message),
        None => classify(status, None),
    }
}

fn classify(status: StatusCode, message: Option<String>) -> RentError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return RentError::Transient {
            status: Some(status.as_u16()),
            detail: message.unwrap_or_else(|| "Too many payment attempts, slow down.".to_string()),
        };
    }
    RentError::from_status(status.as_u16(), message)
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    status: String,
    #[serde(default)]
    next_action: Option<StripeNextAction>,
    #[serde(default)]
    last_payment_error: Option<StripeError>,
}

#[derive(Debug, Deserialize)]
struct StripeNextAction {
    #[serde(default)]
    redirect_to_url: Option<StripeRedirect>,
}

#[derive(Debug, Deserialize)]
struct StripeRedirect {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
}
