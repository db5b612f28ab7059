//! # Reservation Orchestrator
//!
//! The one entry point every UI uses to reserve an item.
//!
//! ```text
//! reserve(item, window?)
//!   ├─ no session?            → NotAuthenticated   (no request)
//!   ├─ cached unavailable?    → ItemUnavailable    (no request)
//!   ├─ POST /rentals/         → rental + deposit
//!   └─ POST /payments/create-intent {amount: deposit}
//!                             → handshake secret
//! ```
//!
//! Each call is attempted once. Retrying is the user's decision, because a
//! blind retry of rental creation can leave duplicate pending rentals.

use crate::catalog::CatalogReader;
use crate::payments::PaymentService;
use crate::rentals::RentalService;
use crate::session::SessionStore;
use rent_core::{
    AttemptId, RentError, RentResult, Rental, RentalWindow, Reservation, ReservationFailure,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{field, info, instrument, warn, Span};

/// Held while a reservation is in flight; released on drop, including when
/// the caller abandons the future.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sequences rental creation and payment intent creation
pub struct ReservationOrchestrator {
    session: Arc<SessionStore>,
    catalog: Arc<CatalogReader>,
    rentals: Arc<RentalService>,
    payments: Arc<PaymentService>,
    in_flight: AtomicBool,
}

impl ReservationOrchestrator {
    pub fn new(
        session: Arc<SessionStore>,
        catalog: Arc<CatalogReader>,
        rentals: Arc<RentalService>,
        payments: Arc<PaymentService>,
    ) -> Self {
        Self {
            session,
            catalog,
            rentals,
            payments,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a reservation or payment retry is pending
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Reserve `item_id` for `window` (default: one hour from now).
    ///
    /// On failure the returned [`ReservationFailure`] tells whether the
    /// rental was already created. A success status with an unreadable body
    /// is reported with `outcome_unknown` set and the "my rentals" cache
    /// invalidated, since the pending rental may exist.
    #[instrument(skip(self, window), fields(attempt_id = field::Empty))]
    pub async fn reserve(
        &self,
        item_id: u64,
        window: Option<RentalWindow>,
    ) -> Result<Reservation, ReservationFailure> {
        if !self.session.is_logged_in() {
            return Err(RentError::NotAuthenticated.into());
        }

        // Advisory only: the rental service re-checks availability.
        if self.catalog.cached_availability(item_id) == Some(false) {
            return Err(RentError::ItemUnavailable { item_id }.into());
        }

        let _guard =
            InFlightGuard::acquire(&self.in_flight).ok_or(RentError::ReservationInProgress)?;

        let window = window.unwrap_or_else(RentalWindow::starting_now);
        let attempt_id = AttemptId::new();
        Span::current().record("attempt_id", field::display(attempt_id));

        let rental = self
            .rentals
            .create(item_id, &window, Some(attempt_id))
            .await
            .map_err(|error| match error {
                RentError::Serialization(_) => {
                    warn!(
                        "Rental service accepted item {} but the response was unreadable; a pending rental may exist: {}",
                        item_id, error
                    );
                    self.rentals.invalidate_my_rentals();
                    self.catalog.invalidate_items();
                    ReservationFailure::unknown_outcome(error)
                }
                error => {
                    warn!("Rental creation failed: {}", error);
                    ReservationFailure::before_rental(error)
                }
            })?;
        self.catalog.invalidate_items();

        // The charge is whatever the rental service decided the deposit is.
        match self.payments.create_intent(rental.deposit).await {
            Ok(handshake_secret) => {
                info!("Reservation ready for payment: rental={}", rental.id);
                Ok(Reservation {
                    attempt_id,
                    handshake_secret,
                    rental,
                })
            }
            Err(error) => {
                warn!(
                    "Payment intent failed after rental {} was created: {}",
                    rental.id, error
                );
                Err(ReservationFailure::after_rental(error, rental))
            }
        }
    }

    /// Mint a new payment intent for a rental that already exists.
    ///
    /// Used after a reservation failed at the payment step; never creates
    /// another rental.
    #[instrument(skip(self, rental), fields(rental_id = rental.id))]
    pub async fn retry_payment(&self, rental: &Rental) -> RentResult<Reservation> {
        if !self.session.is_logged_in() {
            return Err(RentError::NotAuthenticated);
        }

        if !rental.is_pending() {
            return Err(RentError::InvalidRequest(format!(
                "rental {} is {}, not pending",
                rental.id, rental.status
            )));
        }

        let _guard =
            InFlightGuard::acquire(&self.in_flight).ok_or(RentError::ReservationInProgress)?;

        let handshake_secret = self.payments.create_intent(rental.deposit).await?;
        Ok(Reservation {
            attempt_id: AttemptId::new(),
            handshake_secret,
            rental: rental.clone(),
        })
    }
}

impl std::fmt::Debug for ReservationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationOrchestrator")
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::ApiClient;
    use chrono::{TimeZone, Utc};
    use rent_core::{Item, RentalStatus};
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        orchestrator: ReservationOrchestrator,
        catalog: Arc<CatalogReader>,
        rentals: Arc<RentalService>,
    }

    fn fixture(server: &MockServer, token: Option<&str>) -> Fixture {
        let session = Arc::new(SessionStore::in_memory());
        if let Some(token) = token {
            session.set_token(token).unwrap();
        }
        let config = ClientConfig::default().with_api_base_url(server.uri());
        let api = ApiClient::new(config, session.clone()).unwrap();

        let catalog = Arc::new(CatalogReader::new(api.clone()));
        let rentals = Arc::new(RentalService::new(api.clone()));
        let payments = Arc::new(PaymentService::new(api));

        Fixture {
            orchestrator: ReservationOrchestrator::new(
                session,
                catalog.clone(),
                rentals.clone(),
                payments,
            ),
            catalog,
            rentals,
        }
    }

    fn item(id: u64, available: bool) -> Item {
        serde_json::from_value(json!({
            "id": id,
            "name": "Drill",
            "price_per_h": 5.0,
            "available": available
        }))
        .unwrap()
    }

    async fn mount_rental(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/rentals/"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    async fn mount_intent(server: &MockServer, amount: f64, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/payments/create-intent"))
            .and(body_json(json!({"amount": amount})))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_reserve_happy_path() {
        let server = MockServer::start().await;
        mount_rental(
            &server,
            ResponseTemplate::new(201).set_body_json(json!({"id": 7, "deposit": 5.0})),
        )
        .await;
        mount_intent(
            &server,
            5.0,
            ResponseTemplate::new(200).set_body_json(json!({"client_secret": "sec_123"})),
        )
        .await;

        let fx = fixture(&server, Some("abc"));
        fx.catalog.remember(&item(42, true));

        let before = Utc::now();
        let reservation = fx.orchestrator.reserve(42, None).await.unwrap();
        assert_eq!(reservation.handshake_secret.expose(), "sec_123");
        assert_eq!(reservation.rental.id, 7);
        assert_eq!(reservation.rental.deposit, 5.0);
        assert!(!fx.orchestrator.is_busy());
        // item reads are stale once the rental exists
        assert_eq!(fx.catalog.cached_availability(42), None);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), "/rentals/");
        assert_eq!(requests[1].url.path(), "/payments/create-intent");

        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["item_id"], 42);
        let start: chrono::DateTime<Utc> = body["start_at"].as_str().unwrap().parse().unwrap();
        let end: chrono::DateTime<Utc> = body["end_at"].as_str().unwrap().parse().unwrap();
        assert!(start >= before - chrono::Duration::seconds(1));
        assert_eq!(end - start, chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn test_deposit_forwarded_exactly() {
        let server = MockServer::start().await;
        mount_rental(
            &server,
            ResponseTemplate::new(201).set_body_json(json!({"id": 3, "deposit": 12.50})),
        )
        .await;
        mount_intent(
            &server,
            12.50,
            ResponseTemplate::new(200).set_body_json(json!({"client_secret": "pi_9_secret_z"})),
        )
        .await;

        let fx = fixture(&server, Some("abc"));
        let window = RentalWindow::new(
            Utc.with_ymd_and_hms(2026, 11, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap(),
        )
        .unwrap();

        let reservation = fx.orchestrator.reserve(42, Some(window)).await.unwrap();
        assert_eq!(reservation.handshake_secret.intent_id(), Some("pi_9"));
    }

    #[tokio::test]
    async fn test_unavailable_item_makes_no_requests() {
        let server = MockServer::start().await;
        let fx = fixture(&server, Some("abc"));
        fx.catalog.remember(&item(42, false));

        let failure = fx.orchestrator.reserve(42, None).await.unwrap_err();
        assert_eq!(failure.error, RentError::ItemUnavailable { item_id: 42 });
        assert!(!failure.rental_created());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_session_makes_no_requests() {
        let server = MockServer::start().await;
        let fx = fixture(&server, None);
        fx.catalog.remember(&item(42, true));

        let failure = fx.orchestrator.reserve(42, None).await.unwrap_err();
        assert_eq!(failure.error, RentError::NotAuthenticated);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rental_rejected_is_validation() {
        let server = MockServer::start().await;
        mount_rental(
            &server,
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Ítem no disponible"})),
        )
        .await;

        let fx = fixture(&server, Some("abc"));
        let failure = fx.orchestrator.reserve(42, None).await.unwrap_err();

        assert!(!failure.rental_created());
        assert_eq!(
            failure.error,
            RentError::Validation {
                status: 400,
                detail: "Ítem no disponible".into()
            }
        );
        // payment step never ran
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_rental_response_is_unknown_outcome() {
        let server = MockServer::start().await;
        mount_rental(&server, ResponseTemplate::new(201).set_body_string("{\"id\": 7,")).await;
        Mock::given(method("GET"))
            .and(path("/rentals/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "deposit": 5.0, "status": "pending"}
            ])))
            .mount(&server)
            .await;

        let fx = fixture(&server, Some("abc"));
        fx.rentals.my_rentals().await.unwrap();

        let failure = fx.orchestrator.reserve(42, None).await.unwrap_err();
        assert!(matches!(failure.error, RentError::Serialization(_)));
        assert!(!failure.rental_created());
        assert!(failure.outcome_unknown);
        assert!(failure.rental_may_exist());

        // the cached list is stale: the next read goes back to the service
        let mine = fx.rentals.my_rentals().await.unwrap();
        assert_eq!(mine[0].id, 7);
        let requests = server.received_requests().await.unwrap();
        let list_reads = requests.iter().filter(|r| r.url.path() == "/rentals/me").count();
        assert_eq!(list_reads, 2);
        assert!(requests.iter().all(|r| r.url.path() != "/payments/create-intent"));
    }

    #[tokio::test]
    async fn test_intent_failure_keeps_rental() {
        let server = MockServer::start().await;
        mount_rental(
            &server,
            ResponseTemplate::new(201).set_body_json(json!({"id": 7, "deposit": 5.0})),
        )
        .await;
        mount_intent(&server, 5.0, ResponseTemplate::new(503)).await;

        let fx = fixture(&server, Some("abc"));
        let failure = fx.orchestrator.reserve(42, None).await.unwrap_err();

        assert!(failure.error.is_retryable());
        let rental = failure.rental.expect("rental should be returned");
        assert_eq!(rental.id, 7);
        assert_eq!(rental.status, RentalStatus::Pending);
    }

    #[tokio::test]
    async fn test_retry_payment_reuses_rental() {
        let server = MockServer::start().await;
        mount_intent(
            &server,
            5.0,
            ResponseTemplate::new(200).set_body_json(json!({"client_secret": "sec_retry"})),
        )
        .await;

        let fx = fixture(&server, Some("abc"));
        let rental: Rental = serde_json::from_value(json!({"id": 7, "deposit": 5.0})).unwrap();

        let reservation = fx.orchestrator.retry_payment(&rental).await.unwrap();
        assert_eq!(reservation.rental.id, 7);
        assert_eq!(reservation.handshake_secret.expose(), "sec_retry");

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.url.path() != "/rentals/"));
    }

    #[tokio::test]
    async fn test_retry_payment_rejects_confirmed_rental() {
        let server = MockServer::start().await;
        let fx = fixture(&server, Some("abc"));
        let rental: Rental =
            serde_json::from_value(json!({"id": 7, "deposit": 5.0, "status": "confirmed"}))
                .unwrap();

        assert!(matches!(
            fx.orchestrator.retry_payment(&rental).await,
            Err(RentError::InvalidRequest(_))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_reserve_is_rejected() {
        let server = MockServer::start().await;
        mount_rental(
            &server,
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 7, "deposit": 5.0}))
                .set_delay(Duration::from_millis(200)),
        )
        .await;
        mount_intent(
            &server,
            5.0,
            ResponseTemplate::new(200).set_body_json(json!({"client_secret": "sec_123"})),
        )
        .await;

        let fx = fixture(&server, Some("abc"));
        let (first, second) = tokio::join!(
            fx.orchestrator.reserve(42, None),
            fx.orchestrator.reserve(42, None)
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().error, RentError::ReservationInProgress);

        let rental_posts = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/rentals/")
            .count();
        assert_eq!(rental_posts, 1);
    }

    #[tokio::test]
    async fn test_abandoned_reserve_releases_guard() {
        let server = MockServer::start().await;
        mount_rental(
            &server,
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 7, "deposit": 5.0}))
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let fx = fixture(&server, Some("abc"));
        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), fx.orchestrator.reserve(42, None))
                .await;
        assert!(abandoned.is_err());
        assert!(!fx.orchestrator.is_busy());
    }
}
