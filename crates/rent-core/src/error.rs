//! # Rental Error Types
//!
//! Typed error handling for the rent-cart client.
//! All reservation, catalog and payment operations return `Result<T, RentError>`.

use thiserror::Error;

/// Shown when a service failed without giving a human-readable reason.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Core error type for all client operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RentError {
    /// No session token; raised before any network call
    #[error("You need to log in first")]
    NotAuthenticated,

    /// Client-side availability pre-check failed
    #[error("Item {item_id} is not available")]
    ItemUnavailable { item_id: u64 },

    /// The service rejected the request (4xx)
    #[error("Request rejected ({status}): {detail}")]
    Validation { status: u16, detail: String },

    /// Network failure, timeout or server-side fault (5xx)
    #[error("Service temporarily unavailable: {detail}")]
    Transient { status: Option<u16>, detail: String },

    /// The payment processor declined the charge
    #[error("Payment declined: {reason}")]
    ProcessorDeclined {
        reason: String,
        code: Option<String>,
    },

    /// Another reservation attempt is still pending for this session
    #[error("A reservation is already in progress")]
    ReservationInProgress,

    /// The confirmation dialog was closed before the outcome arrived
    #[error("Payment confirmation is no longer open")]
    ConfirmationClosed,

    /// Request rejected client-side before reaching a service
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors (missing keys, invalid URLs)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session token persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RentError {
    /// Returns true if the user may retry the same action.
    ///
    /// Nothing in this crate retries on its own; this only tells the UI
    /// whether to offer a retry button.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RentError::Transient { .. })
    }

    /// True when a protected call was refused because the session is no
    /// longer valid. Callers typically clear the session on this.
    pub fn is_authorization_denied(&self) -> bool {
        matches!(self, RentError::Validation { status: 401 | 403, .. })
    }

    /// Text suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            RentError::Validation { detail, .. } | RentError::Transient { detail, .. }
                if detail.trim().is_empty() =>
            {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            RentError::Validation { detail, .. } | RentError::Transient { detail, .. } => {
                detail.clone()
            }
            RentError::ProcessorDeclined { reason, .. } => reason.clone(),
            RentError::Serialization(_) | RentError::Storage(_) | RentError::Internal(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Build an error from an HTTP status and an optional service detail.
    ///
    /// 4xx maps to `Validation`, everything else to `Transient`.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());

        if (400..500).contains(&status) {
            RentError::Validation { status, detail }
        } else {
            RentError::Transient {
                status: Some(status),
                detail,
            }
        }
    }
}

/// Result type alias for client operations
pub type RentResult<T> = Result<T, RentError>;
