pub mod http_payment_gateway;

use crate::domain::models::booking::Booking;
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;

/// Used when no payment service is configured: every confirmation is
/// treated as already paid (credit-only studios).
pub struct PermissivePaymentGateway;

#[async_trait]
impl PaymentGateway for PermissivePaymentGateway {
    async fn payment_cleared(&self, _booking: &Booking) -> Result<bool, AppError> {
        Ok(true)
    }
}
