//! The payment gateway seam.

use async_trait::async_trait;
use paydesk_core::{PaymentCreated, PaymentRecord, PaymentRequest, Result};
use uuid::Uuid;

/// Operations the rest of the system needs from a payment gateway.
///
/// Implemented by [`crate::SignedRequestClient`] against the real API and by
/// scripted fakes in tests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment and obtain its payment link.
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentCreated>;

    /// Fetch the current state of a payment by its order id.
    async fn check_status(&self, order_id: Uuid) -> Result<PaymentRecord>;
}
