//! # rent-stripe
//!
//! Stripe payment processor for rent-cart.
//!
//! The rental payment service creates the PaymentIntent server-side and hands
//! back its client secret. This crate confirms that intent with the user's
//! payment method, authenticating with the publishable key only.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rent_stripe::StripeProcessor;
//! use rent_client::{ClientConfig, Marketplace};
//! use std::sync::Arc;
//!
//! let processor = StripeProcessor::from_env()?;
//! let market = Marketplace::new(ClientConfig::from_env()?, Arc::new(processor))?;
//!
//! let reservation = market.reservations.reserve(42, None).await?;
//! let outcome = market
//!     .confirmation
//!     .confirm(reservation.handshake_secret, PaymentMethodDetails::Existing("pm_card_visa".into()))
//!     .await?;
//! ```

pub mod config;
pub mod processor;

// Re-exports
pub use config::StripeConfig;
pub use processor::StripeProcessor;
