//! # HTTP Client
//!
//! The single request issuer for every marketplace service.
//! Attaches the bearer token when a session exists, refuses protected calls
//! without one, and turns every failure into a typed [`RentError`].

use crate::config::ClientConfig;
use crate::session::SessionStore;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use rent_core::{RentError, RentResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether a call needs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Fail with `NotAuthenticated` before touching the network
    Required,
    /// Attach the token if there is one
    IfPresent,
}

/// Configured request issuer shared by all service wrappers
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    client: Client,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<SessionStore>) -> RentResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RentError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            client,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Start a request, attaching credentials per `auth`
    pub fn request(&self, method: Method, path: &str, auth: Auth) -> RentResult<RequestBuilder> {
        let token = self.session.token();
        if auth == Auth::Required && token.is_none() {
            return Err(RentError::NotAuthenticated);
        }

        let mut builder = self.client.request(method, self.config.url(path));
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, token.header_value());
        }
        Ok(builder)
    }

    /// Send a request and classify any failure
    pub async fn execute(&self, builder: RequestBuilder) -> RentResult<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let error = error_from_response(status, &body);
        warn!("Service error: {} {} -> {}", status.as_u16(), url, error);
        Err(error)
    }

    /// Send a request and decode the JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> RentResult<T> {
        let (value, _) = self.fetch_with_headers(builder).await?;
        Ok(value)
    }

    /// Like [`fetch`](Self::fetch) but also returns the response headers
    pub async fn fetch_with_headers<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> RentResult<(T, HeaderMap)> {
        let response = self.execute(builder).await?;
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?;

        let value = serde_json::from_slice(&body).map_err(|e| {
            RentError::Serialization(format!("Failed to parse service response: {}", e))
        })?;
        Ok((value, headers))
    }

    /// `GET path?query` decoded as JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
        auth: Auth,
    ) -> RentResult<T> {
        let builder = self.request(Method::GET, path, auth)?.query(query);
        self.fetch(builder).await
    }

    /// `POST path` with a JSON body, decoded as JSON
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> RentResult<T> {
        let builder = self.request(Method::POST, path, auth)?.json(body);
        self.fetch(builder).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.api_base_url)
            .finish_non_exhaustive()
    }
}

fn transport_error(e: reqwest::Error) -> RentError {
    warn!("Transport error: {}", e);
    let detail = if e.is_timeout() {
        "The service took too long to respond."
    } else {
        "Could not reach the service. Check your connection and try again."
    };
    RentError::Transient {
        status: None,
        detail: detail.to_string(),
    }
}

/// Map a failed response to the error taxonomy.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> RentError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(extract_detail);
    debug!("Normalized service error detail: {:?}", detail);
    RentError::from_status(status.as_u16(), detail)
}

/// Pull a human-readable reason out of a service error body.
///
/// Accepts `{"detail": "..."}`, `{"detail": [{"msg": "..."}, ...]}` and
/// `{"message": "..."}`.
fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Array(entries)) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .map(String::from)
}
