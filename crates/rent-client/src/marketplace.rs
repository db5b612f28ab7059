//! # Marketplace
//!
//! Shared state for a rent-cart front end: one session, one HTTP client and
//! every service wired to them.

use crate::auth::AuthApi;
use crate::catalog::CatalogReader;
use crate::config::ClientConfig;
use crate::confirmation::PaymentConfirmation;
use crate::http::ApiClient;
use crate::payments::PaymentService;
use crate::rentals::RentalService;
use crate::reservation::ReservationOrchestrator;
use crate::session::{FileTokenStore, SessionStore};
use crate::upload::UploadApi;
use rent_core::{BoxedPaymentProcessor, RentResult};
use std::sync::Arc;
use tracing::info;

/// Everything a UI needs, cheap to clone
#[derive(Clone)]
pub struct Marketplace {
    pub session: Arc<SessionStore>,
    pub auth: Arc<AuthApi>,
    pub catalog: Arc<CatalogReader>,
    pub rentals: Arc<RentalService>,
    pub payments: Arc<PaymentService>,
    pub uploads: Arc<UploadApi>,
    pub reservations: Arc<ReservationOrchestrator>,
    pub confirmation: PaymentConfirmation,
    config: Arc<ClientConfig>,
}

impl Marketplace {
    /// Wire all services against `config`, confirming payments with `processor`
    pub fn new(config: ClientConfig, processor: BoxedPaymentProcessor) -> RentResult<Self> {
        let config = config.validate()?;

        let session = Arc::new(match &config.token_path {
            Some(path) => {
                info!("Session token file: {}", path.display());
                SessionStore::init(Box::new(FileTokenStore::new(path)))?
            }
            None => SessionStore::in_memory(),
        });

        let api = ApiClient::new(config.clone(), session.clone())?;

        let catalog = Arc::new(CatalogReader::new(api.clone()));
        let rentals = Arc::new(RentalService::new(api.clone()));
        let payments = Arc::new(PaymentService::new(api.clone()));
        let reservations = Arc::new(ReservationOrchestrator::new(
            session.clone(),
            catalog.clone(),
            rentals.clone(),
            payments.clone(),
        ));
        let confirmation = PaymentConfirmation::new(processor, rentals.clone());

        info!(
            "Marketplace ready: api={}, processor={}",
            config.api_base_url,
            confirmation.processor_name()
        );

        Ok(Self {
            session,
            auth: Arc::new(AuthApi::new(api.clone())),
            catalog,
            rentals,
            payments,
            uploads: Arc::new(UploadApi::new(api)),
            reservations,
            confirmation,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
