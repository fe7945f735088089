use crate::domain::models::booking::Booking;
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::error;

/// Asks the external payment collaborator whether money has cleared for a
/// booking. The engine never moves money itself.
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct PaymentStatus {
    cleared: bool,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn payment_cleared(&self, booking: &Booking) -> Result<bool, AppError> {
        let url = format!("{}/payments/{}/status", self.base_url, booking.id);
        let res = self.client.get(&url).send().await.map_err(|e| {
            let msg = format!("Payment service connection error: {}", e);
            error!("{}", msg);
            AppError::Internal(msg)
        })?;

        if !res.status().is_success() {
            let msg = format!("Payment service failed. Status: {}", res.status());
            error!("{}", msg);
            return Err(AppError::Internal(msg));
        }

        let status = res.json::<PaymentStatus>().await.map_err(|e| {
            AppError::Internal(format!("Payment service returned invalid payload: {}", e))
        })?;
        Ok(status.cleared)
    }
}
