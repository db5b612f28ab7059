//! # Rental Service
//!
//! Thin wrapper over the rental endpoints plus the cached "my rentals" list.

use crate::cache::TtlCache;
use crate::http::{ApiClient, Auth};
use reqwest::Method;
use rent_core::{
    AttemptId, CreateRentalRequest, DateRange, RentError, RentResult, Rental, RentalWindow,
};
use tracing::{debug, info, instrument};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Rental endpoints of the marketplace
pub struct RentalService {
    api: ApiClient,
    /// Keyed by bearer token so a new login never sees the previous user's list
    mine: TtlCache<String, Vec<Rental>>,
}

impl RentalService {
    pub fn new(api: ApiClient) -> Self {
        let ttl = api.config().rental_ttl();
        Self {
            api,
            mine: TtlCache::new(ttl),
        }
    }

    /// Create a pending rental (`POST /rentals/`).
    ///
    /// The returned record carries the deposit computed by the service.
    /// `attempt` is sent as `Idempotency-Key` only when enabled in config.
    #[instrument(skip(self, window), fields(start = %window.start_at(), end = %window.end_at()))]
    pub async fn create(
        &self,
        item_id: u64,
        window: &RentalWindow,
        attempt: Option<AttemptId>,
    ) -> RentResult<Rental> {
        let body = CreateRentalRequest::new(item_id, window);
        let mut builder = self
            .api
            .request(Method::POST, "/rentals/", Auth::Required)?
            .json(&body);

        if let Some(attempt) = attempt.filter(|_| self.api.config().idempotency_keys) {
            builder = builder.header(IDEMPOTENCY_HEADER, attempt.to_string());
        }

        let rental: Rental = self.api.fetch(builder).await?;
        info!(
            "Created rental: id={}, deposit={}, status={}",
            rental.id, rental.deposit, rental.status
        );
        Ok(rental)
    }

    /// Current user's rentals (`GET /rentals/me`), cached
    #[instrument(skip(self))]
    pub async fn my_rentals(&self) -> RentResult<Vec<Rental>> {
        let token = self
            .api
            .session()
            .token()
            .ok_or(RentError::NotAuthenticated)?;
        let key = token.expose().to_string();

        if let Some(rentals) = self.mine.get(&key) {
            debug!("Rental list served from cache");
            return Ok(rentals);
        }

        let generation = self.mine.generation();
        let rentals: Vec<Rental> = self.api.get_json("/rentals/me", &[], Auth::Required).await?;
        debug!("Fetched {} rentals", rentals.len());
        if !self.mine.insert_if_current(generation, key, rentals.clone()) {
            debug!("Rental list invalidated during fetch; not caching it");
        }
        Ok(rentals)
    }

    /// Mark the cached rental list stale; the next read re-fetches
    pub fn invalidate_my_rentals(&self) {
        debug!("Invalidating cached rental list");
        self.mine.invalidate_all();
    }

    /// Booked ranges for an item (`GET /rentals/item/{id}/availability`)
    #[instrument(skip(self))]
    pub async fn occupied_ranges(&self, item_id: u64) -> RentResult<Vec<DateRange>> {
        let path = format!("/rentals/item/{}/availability", item_id);
        self.api.get_json(&path, &[], Auth::IfPresent).await
    }
}

impl std::fmt::Debug for RentalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RentalService")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use chrono::{TimeZone, Utc};
    use rent_core::RentalStatus;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer, config: ClientConfig, token: Option<&str>) -> RentalService {
        let session = SessionStore::in_memory();
        if let Some(token) = token {
            session.set_token(token).unwrap();
        }
        let config = config.with_api_base_url(server.uri());
        RentalService::new(ApiClient::new(config, Arc::new(session)).unwrap())
    }

    fn window() -> RentalWindow {
        RentalWindow::new(
            Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 11, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_posts_iso_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rentals/"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(json!({
                "item_id": 42,
                "start_at": "2026-10-20T09:00:00Z",
                "end_at": "2026-10-20T11:00:00Z"
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 7, "deposit": 12.5})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server, ClientConfig::default(), Some("abc"));
        let rental = service.create(42, &window(), Some(AttemptId::new())).await.unwrap();
        assert_eq!(rental.id, 7);
        assert_eq!(rental.deposit, 12.5);

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("idempotency-key"));
    }

    #[tokio::test]
    async fn test_idempotency_key_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rentals/"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 8, "deposit": 1.0})),
            )
            .mount(&server)
            .await;

        let config = ClientConfig::default().with_idempotency_keys(true);
        let service = service_for(&server, config, Some("abc"));
        let attempt = AttemptId::new();
        service.create(1, &window(), Some(attempt)).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let sent = requests[0]
            .headers
            .get("idempotency-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        assert_eq!(sent, Some(attempt.to_string()));
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let server = MockServer::start().await;
        let service = service_for(&server, ClientConfig::default(), None);

        let err = service.create(42, &window(), None).await.unwrap_err();
        assert_eq!(err, RentError::NotAuthenticated);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_my_rentals_cache_and_invalidate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rentals/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "deposit": 5.0, "status": "pending"}
            ])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rentals/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "deposit": 5.0, "status": "confirmed"}
            ])))
            .mount(&server)
            .await;

        let service = service_for(&server, ClientConfig::default(), Some("abc"));
        assert_eq!(service.my_rentals().await.unwrap()[0].status, RentalStatus::Pending);
        // cached: still pending even though the server changed
        assert_eq!(service.my_rentals().await.unwrap()[0].status, RentalStatus::Pending);

        service.invalidate_my_rentals();
        assert_eq!(service.my_rentals().await.unwrap()[0].status, RentalStatus::Confirmed);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_in_flight_during_invalidation_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rentals/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 7, "deposit": 5.0, "status": "pending"}]))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rentals/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "deposit": 5.0, "status": "confirmed"}
            ])))
            .mount(&server)
            .await;

        let service = service_for(&server, ClientConfig::default(), Some("abc"));
        let (slow, ()) = tokio::join!(service.my_rentals(), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            service.invalidate_my_rentals();
        });
        assert_eq!(slow.unwrap()[0].status, RentalStatus::Pending);

        assert_eq!(service.my_rentals().await.unwrap()[0].status, RentalStatus::Confirmed);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_occupied_ranges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rentals/item/42/availability"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"start_at": "2026-10-20T10:00:00Z", "end_at": "2026-10-20T12:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let service = service_for(&server, ClientConfig::default(), None);
        let ranges = service.occupied_ranges(42).await.unwrap();
        assert_eq!(ranges.len(), 1);
        assert!(window().overlaps(&ranges[0]));
    }
}
