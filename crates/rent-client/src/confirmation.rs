//! # Payment Confirmation
//!
//! Confirms a handshake secret with the external processor on behalf of a
//! confirmation dialog.
//!
//! The processor call runs on its own task: once submitted it completes even
//! if the caller stops waiting. When the dialog was closed meanwhile, the
//! outcome is logged and discarded and nothing else is touched.
//!
//! A dialog confirms its intent at most once: after a settled outcome it
//! refuses further submissions. Declines and errors leave it open for retry.

use crate::rentals::RentalService;
use rent_core::{
    BoxedPaymentProcessor, ConfirmationOutcome, HandshakeSecret, PaymentMethodDetails, RentError,
    RentResult,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Opens confirmation dialogs against one processor
#[derive(Clone)]
pub struct PaymentConfirmation {
    processor: BoxedPaymentProcessor,
    rentals: Arc<RentalService>,
}

impl PaymentConfirmation {
    pub fn new(processor: BoxedPaymentProcessor, rentals: Arc<RentalService>) -> Self {
        Self { processor, rentals }
    }

    pub fn processor_name(&self) -> &'static str {
        self.processor.processor_name()
    }

    /// Open a dialog for `secret`
    pub fn open(&self, secret: HandshakeSecret) -> ConfirmationDialog {
        ConfirmationDialog {
            secret,
            processor: self.processor.clone(),
            rentals: self.rentals.clone(),
            open: Arc::new(AtomicBool::new(true)),
            submitting: Arc::new(AtomicBool::new(false)),
            consumed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// One-shot confirmation without a long-lived dialog
    pub async fn confirm(
        &self,
        secret: HandshakeSecret,
        details: PaymentMethodDetails,
    ) -> RentResult<ConfirmationOutcome> {
        self.open(secret).submit(details).await
    }
}

/// A single open confirmation dialog.
///
/// Dropping the dialog closes it.
pub struct ConfirmationDialog {
    secret: HandshakeSecret,
    processor: BoxedPaymentProcessor,
    rentals: Arc<RentalService>,
    open: Arc<AtomicBool>,
    submitting: Arc<AtomicBool>,
    /// Set once the intent reached a settled outcome
    consumed: Arc<AtomicBool>,
}

impl ConfirmationDialog {
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Whether the intent was already confirmed through this dialog
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn secret(&self) -> &HandshakeSecret {
        &self.secret
    }

    /// Close the dialog; an in-flight confirmation still finishes but its
    /// result is discarded.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Submit the payment method to the processor, once.
    ///
    /// On a settled outcome the "my rentals" cache is invalidated so the
    /// next read shows the confirmed rental, and later submissions fail with
    /// `ConfirmationClosed`. Declines come back as `ProcessorDeclined` with
    /// the processor's message unchanged.
    #[instrument(skip(self, details), fields(intent = ?self.secret.intent_id()))]
    pub async fn submit(&self, details: PaymentMethodDetails) -> RentResult<ConfirmationOutcome> {
        if !self.is_open() || self.is_consumed() {
            return Err(RentError::ConfirmationClosed);
        }
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RentError::InvalidRequest(
                "payment is already being confirmed".into(),
            ));
        }
        // a submission that settled between the first check and the swap
        if self.is_consumed() {
            self.submitting.store(false, Ordering::Release);
            return Err(RentError::ConfirmationClosed);
        }

        let secret = self.secret.clone();
        let processor = self.processor.clone();
        let rentals = self.rentals.clone();
        let open = self.open.clone();
        let submitting = self.submitting.clone();
        let consumed = self.consumed.clone();

        let task = tokio::spawn(async move {
            let result = settle(&processor, &rentals, &open, &secret, &details).await;
            if matches!(&result, Ok(outcome) if outcome.is_settled()) {
                consumed.store(true, Ordering::Release);
            }
            submitting.store(false, Ordering::Release);
            result
        });

        task.await.map_err(|e| {
            error!("Confirmation task failed: {}", e);
            self.submitting.store(false, Ordering::Release);
            RentError::Internal(format!("confirmation task failed: {}", e))
        })?
    }
}

impl Drop for ConfirmationDialog {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ConfirmationDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationDialog")
            .field("secret", &self.secret)
            .field("open", &self.is_open())
            .field("submitting", &self.is_submitting())
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Run one confirmation and apply its effects while the dialog is open
async fn settle(
    processor: &BoxedPaymentProcessor,
    rentals: &RentalService,
    open: &AtomicBool,
    secret: &HandshakeSecret,
    details: &PaymentMethodDetails,
) -> RentResult<ConfirmationOutcome> {
    let result = processor.confirm(secret, details).await;

    if !open.load(Ordering::Acquire) {
        match &result {
            Ok(outcome) => info!(
                "Dialog closed; discarding outcome for {}",
                outcome.intent_id()
            ),
            Err(e) => info!("Dialog closed; discarding error: {}", e),
        }
        return Err(RentError::ConfirmationClosed);
    }

    match &result {
        Ok(outcome) if outcome.is_settled() => {
            info!(
                "Payment confirmed via {}: {}",
                processor.processor_name(),
                outcome.intent_id()
            );
            rentals.invalidate_my_rentals();
        }
        Ok(outcome) => info!("Payment needs further action: {}", outcome.intent_id()),
        Err(e) => warn!("Payment confirmation failed: {}", e),
    }
    result
}
