use crate::domain::models::booking::Booking;
use crate::domain::ports::{BookingNotification, NotificationDispatcher};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Posts booking events to the external notification dispatcher. Delivery
/// is best effort; callers fire-and-forget and only log failures.
pub struct HttpNotificationService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotificationService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    event: &'a str,
    booking_id: &'a str,
    studio_id: &'a str,
    trainer_id: &'a str,
    client_id: &'a str,
    start_at: String,
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationService {
    async fn dispatch(&self, kind: BookingNotification, booking: &Booking) -> Result<(), AppError> {
        let payload = NotificationPayload {
            event: kind.as_str(),
            booking_id: &booking.id,
            studio_id: &booking.studio_id,
            trainer_id: &booking.trainer_id,
            client_id: &booking.client_id,
            start_at: booking.start_at.to_rfc3339(),
        };

        let res = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification service connection error: {}", e);
                error!("{}", msg);
                AppError::Internal(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Internal(msg));
        }

        Ok(())
    }
}
