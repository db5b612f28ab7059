//! # Payment Service
//!
//! Mints payment intents for rental deposits. Confirmation happens against
//! the external processor, see [`crate::confirmation`].

use crate::http::{ApiClient, Auth};
use rent_core::{CreateIntentRequest, HandshakeSecret, PaymentIntent, RentResult};
use tracing::{info, instrument};

pub struct PaymentService {
    api: ApiClient,
}

impl PaymentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /payments/create-intent` for exactly `amount`
    #[instrument(skip(self))]
    pub async fn create_intent(&self, amount: f64) -> RentResult<HandshakeSecret> {
        let intent: PaymentIntent = self
            .api
            .post_json(
                "/payments/create-intent",
                &CreateIntentRequest { amount },
                Auth::Required,
            )
            .await?;

        info!("Created payment intent: {:?}", intent.client_secret.intent_id());
        Ok(intent.client_secret)
    }
}

impl std::fmt::Debug for PaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("api", &self.api)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use rent_core::RentError;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> PaymentService {
        let session = SessionStore::in_memory();
        session.set_token("abc").unwrap();
        let config = ClientConfig::default().with_api_base_url(server.uri());
        PaymentService::new(ApiClient::new(config, Arc::new(session)).unwrap())
    }

    #[tokio::test]
    async fn test_create_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/create-intent"))
            .and(body_json(json!({"amount": 12.5})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"client_secret": "pi_1_secret_x"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let secret = service_for(&server).create_intent(12.5).await.unwrap();
        assert_eq!(secret.intent_id(), Some("pi_1"));
    }

    #[tokio::test]
    async fn test_processor_outage_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/create-intent"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service_for(&server).create_intent(1.0).await.unwrap_err();
        assert!(matches!(err, RentError::Transient { status: Some(500), .. }));
    }
}
