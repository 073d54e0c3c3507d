use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::alert::{NewAlert, PriceAlert};
use super::traits::AlertsApi;

/// Process-local alerts store with the same contract as the REST service.
///
/// Used when no alerts service is configured. Ids are random UUIDs, and
/// deleting an unknown id is an error just like a 404 would be.
#[derive(Default)]
pub struct InMemoryAlertsApi {
    alerts: Mutex<Vec<PriceAlert>>,
}

impl InMemoryAlertsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing alerts.
    pub fn with_alerts(alerts: Vec<PriceAlert>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
        }
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AlertsApi for InMemoryAlertsApi {
    async fn list_alerts(&self) -> Result<Vec<PriceAlert>, CoreError> {
        Ok(self.alerts.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn create_alert(&self, alert: &NewAlert) -> Result<PriceAlert, CoreError> {
        let created = PriceAlert {
            id: Uuid::new_v4().to_string(),
            coin_id: alert.coin_id.clone(),
            coin_name: alert.coin_name.clone(),
            target_price: alert.target_price,
        };
        self.alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(created.clone());
        Ok(created)
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        let mut alerts = self.alerts.lock().unwrap_or_else(|e| e.into_inner());
        let idx = alerts
            .iter()
            .position(|a| a.id == alert_id)
            .ok_or_else(|| CoreError::Api {
                provider: "Alerts".into(),
                message: format!("Alert {alert_id} not found"),
            })?;
        alerts.remove(idx);
        Ok(())
    }
}
