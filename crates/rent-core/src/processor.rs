//! # Payment Processor Trait
//!
//! Seam between the confirmation component and the external processor that
//! actually moves money. The payment service only mints a handshake secret;
//! the processor confirms it with the user's payment method.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           PaymentProcessor (trait)           │
//! │  ├── confirm()                               │
//! │  └── processor_name()                        │
//! └──────────────────────────────────────────────┘
//!                        ▲
//!          ┌─────────────┴─────────────┐
//!  ┌───────┴───────┐           ┌───────┴───────┐
//!  │StripeProcessor│           │  test fakes   │
//!  └───────────────┘           └───────────────┘
//! ```

use crate::error::RentResult;
use crate::payment::{ConfirmationOutcome, HandshakeSecret, PaymentMethodDetails};
use async_trait::async_trait;
use std::sync::Arc;

/// External payment processor.
///
/// Implementations attempt the confirmation exactly once. A decline is
/// reported as `RentError::ProcessorDeclined` carrying the processor's own
/// message.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Confirm the intent behind `secret` using `details`.
    async fn confirm(
        &self,
        secret: &HandshakeSecret,
        details: &PaymentMethodDetails,
    ) -> RentResult<ConfirmationOutcome>;

    /// Processor name (for logging)
    fn processor_name(&self) -> &'static str;
}

/// Type alias for a shared processor (dynamic dispatch)
pub type BoxedPaymentProcessor = Arc<dyn PaymentProcessor>;
