//! # Payment Types
//!
//! Payment intents, handshake secrets and payment method details.

use serde::{Deserialize, Serialize};

/// Client-usable secret that authorizes confirming one payment intent.
///
/// Opaque to the client except for the intent id prefix. Never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandshakeSecret(String);

impl HandshakeSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Payment intent id encoded in the secret (`pi_123_secret_abc` -> `pi_123`)
    pub fn intent_id(&self) -> Option<&str> {
        self.0
            .split_once("_secret_")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }
}

impl std::fmt::Debug for HandshakeSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HandshakeSecret(***)")
    }
}

/// Body of `POST /payments/create-intent`
#[derive(Debug, Clone, Serialize)]
pub struct CreateIntentRequest {
    /// Charge amount; always the rental's deposit
    pub amount: f64,
}

/// Response of `POST /payments/create-intent`
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: HandshakeSecret,
}

/// Card data collected from the user
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
}

impl CardDetails {
    pub fn last4(&self) -> &str {
        let digits = self.number.trim();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or_default()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish_non_exhaustive()
    }
}

/// How the user wants to pay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethodDetails {
    /// A payment method the processor already knows (e.g. `pm_card_visa`)
    Existing(String),
    /// Raw card data
    Card(CardDetails),
}

/// Result of a processor confirmation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Funds captured or authorized
    Succeeded { intent_id: String },
    /// Processor accepted the payment and will settle asynchronously
    Processing { intent_id: String },
    /// The user must complete an extra step (3-D Secure, bank redirect)
    RequiresAction {
        intent_id: String,
        redirect_url: Option<String>,
    },
}

impl ConfirmationOutcome {
    /// True when the rental will be confirmed without further user action
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ConfirmationOutcome::Succeeded { .. } | ConfirmationOutcome::Processing { .. }
        )
    }

    pub fn intent_id(&self) -> &str {
        match self {
            ConfirmationOutcome::Succeeded { intent_id }
            | ConfirmationOutcome::Processing { intent_id }
            | ConfirmationOutcome::RequiresAction { intent_id, .. } => intent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_id_from_secret() {
        let secret = HandshakeSecret::new("pi_3Nx_secret_abc123");
        assert_eq!(secret.intent_id(), Some("pi_3Nx"));

        assert_eq!(HandshakeSecret::new("sec_123").intent_id(), None);
        assert_eq!(HandshakeSecret::new("_secret_x").intent_id(), None);
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = HandshakeSecret::new("pi_1_secret_2");
        assert_eq!(format!("{:?}", secret), "HandshakeSecret(***)");

        let card = CardDetails {
            number: "4242424242424242".into(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".into(),
        };
        let debug = format!("{:?}", card);
        assert!(debug.contains("4242"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("cvc"));
    }

    #[test]
    fn test_intent_response() {
        let intent: PaymentIntent =
            serde_json::from_value(json!({"client_secret": "sec_123"})).unwrap();
        assert_eq!(intent.client_secret.expose(), "sec_123");
    }

    #[test]
    fn test_outcome_settled() {
        assert!(ConfirmationOutcome::Processing {
            intent_id: "pi_1".into()
        }
        .is_settled());
        assert!(!ConfirmationOutcome::RequiresAction {
            intent_id: "pi_1".into(),
            redirect_url: None
        }
        .is_settled());
    }
}
