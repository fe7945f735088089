use crate::domain::models::service::ServiceOffering;
use crate::domain::ports::ServiceCatalog;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::error;

/// Reads service definitions (duration, credit price) from the external
/// catalog at booking-creation time.
pub struct HttpServiceCatalog {
    client: Client,
    base_url: String,
}

impl HttpServiceCatalog {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl ServiceCatalog for HttpServiceCatalog {
    async fn get_service(&self, service_id: &str) -> Result<Option<ServiceOffering>, AppError> {
        let url = format!("{}/services/{}", self.base_url, service_id);
        let res = self.client.get(&url).send().await.map_err(|e| {
            let msg = format!("Service catalog connection error: {}", e);
            error!("{}", msg);
            AppError::Internal(msg)
        })?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            let msg = format!("Service catalog failed. Status: {}", res.status());
            error!("{}", msg);
            return Err(AppError::Internal(msg));
        }

        let offering = res.json::<ServiceOffering>().await.map_err(|e| {
            AppError::Internal(format!("Service catalog returned invalid payload: {}", e))
        })?;
        Ok(Some(offering))
    }
}
