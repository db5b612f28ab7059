//! # Reservation Results
//!
//! What a reservation attempt hands back to the UI, on success and on failure.

use crate::error::RentError;
use crate::payment::HandshakeSecret;
use crate::rental::{AttemptId, Rental};

/// A rental plus the secret needed to pay its deposit
#[derive(Debug, Clone)]
pub struct Reservation {
    pub attempt_id: AttemptId,
    pub handshake_secret: HandshakeSecret,
    pub rental: Rental,
}

/// A failed reservation attempt.
///
/// `rental` is `Some` when the rental was created before the failure, so the
/// UI can retry payment against it instead of creating another one.
///
/// `outcome_unknown` is set when the rental service accepted the request but
/// its answer could not be read: a pending rental may exist without the
/// client knowing its id.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct ReservationFailure {
    #[source]
    pub error: RentError,
    pub rental: Option<Rental>,
    pub outcome_unknown: bool,
}

impl ReservationFailure {
    /// Failure before anything was created server-side
    pub fn before_rental(error: RentError) -> Self {
        Self {
            error,
            rental: None,
            outcome_unknown: false,
        }
    }

    /// The rental request was accepted but its result is unreadable
    pub fn unknown_outcome(error: RentError) -> Self {
        Self {
            error,
            rental: None,
            outcome_unknown: true,
        }
    }

    /// Failure after the rental exists
    pub fn after_rental(error: RentError, rental: Rental) -> Self {
        Self {
            error,
            rental: Some(rental),
            outcome_unknown: false,
        }
    }

    pub fn rental_created(&self) -> bool {
        self.rental.is_some()
    }

    /// Whether a pending rental might exist server-side
    pub fn rental_may_exist(&self) -> bool {
        self.rental_created() || self.outcome_unknown
    }
}

impl From<RentError> for ReservationFailure {
    fn from(error: RentError) -> Self {
        Self::before_rental(error)
    }
}
