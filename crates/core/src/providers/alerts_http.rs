use async_trait::async_trait;
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::alert::{NewAlert, PriceAlert};
use crate::models::settings::DEFAULT_ALERTS_URL;
use super::traits::AlertsApi;

const PROVIDER: &str = "Alerts";

/// REST client for the alerts service.
///
/// - `GET    {base}/alerts`
/// - `POST   {base}/alerts`      body `{coinId, coinName, targetPrice}`
/// - `DELETE {base}/alerts/{id}`
pub struct HttpAlertsApi {
    client: Client,
    base_url: String,
}

impl HttpAlertsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(15));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn alerts_url(&self) -> String {
        format!("{}/alerts", self.base_url)
    }

    pub fn alert_url(&self, alert_id: &str) -> String {
        format!("{}/alerts/{alert_id}", self.base_url)
    }

    fn check_status(status: reqwest::StatusCode, what: &str) -> Result<(), CoreError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{what} failed with status {status}"),
            })
        }
    }
}

impl Default for HttpAlertsApi {
    fn default() -> Self {
        Self::new(DEFAULT_ALERTS_URL)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AlertsApi for HttpAlertsApi {
    async fn list_alerts(&self) -> Result<Vec<PriceAlert>, CoreError> {
        let resp = self.client.get(self.alerts_url()).send().await?;
        Self::check_status(resp.status(), "Listing alerts")?;
        resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse alert list: {e}"),
        })
    }

    async fn create_alert(&self, alert: &NewAlert) -> Result<PriceAlert, CoreError> {
        let resp = self
            .client
            .post(self.alerts_url())
            .json(alert)
            .send()
            .await?;
        Self::check_status(resp.status(), "Creating alert")?;
        resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse created alert for {}: {e}", alert.coin_id),
        })
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        let resp = self.client.delete(self.alert_url(alert_id)).send().await?;
        Self::check_status(resp.status(), &format!("Deleting alert {alert_id}"))
    }
}
