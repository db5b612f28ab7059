//! # rent-core
//!
//! Core types and traits for the rent-cart rental marketplace client.
//!
//! This crate provides:
//! - `Item`, `ItemDetail`, `Category` and `ItemQuery` for the catalog
//! - `Rental`, `RentalWindow` and `AttemptId` for reservations
//! - `HandshakeSecret`, `PaymentMethodDetails` and `ConfirmationOutcome` for payment
//! - `PaymentProcessor` trait for the external processor
//! - `RentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use rent_core::{RentalWindow, ReservationFailure};
//!
//! // Reserve the default one-hour window
//! match orchestrator.reserve(42, None).await {
//!     Ok(reservation) => dialog = confirmation.open(reservation.handshake_secret),
//!     Err(ReservationFailure { error, rental: Some(rental), .. }) => offer_retry_payment(rental, error),
//!     Err(failure) => show(failure.error.user_message()),
//! }
//! ```

pub mod error;
pub mod item;
pub mod money;
pub mod payment;
pub mod processor;
pub mod rental;
pub mod reservation;

// Re-exports for convenience
pub use error::{RentError, RentResult, GENERIC_FAILURE_MESSAGE};
pub use item::{
    Category, Condition, Item, ItemDetail, ItemPage, ItemQuery, OrderBy, OrderDir, ShippingType,
};
pub use money::{Currency, Price};
pub use payment::{
    CardDetails, ConfirmationOutcome, CreateIntentRequest, HandshakeSecret, PaymentIntent,
    PaymentMethodDetails,
};
pub use processor::{BoxedPaymentProcessor, PaymentProcessor};
pub use rental::{
    AttemptId, CreateRentalRequest, DateRange, ItemSnapshot, Rental, RentalStatus, RentalWindow,
};
pub use reservation::{Reservation, ReservationFailure};
