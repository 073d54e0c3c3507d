use std::collections::{BTreeSet, HashMap};

use crate::errors::CoreError;
use crate::models::alert::{AlertCrossing, NewAlert, PriceAlert, TriggeredAlert};
use crate::models::coin::CoinMarket;
use crate::providers::traits::AlertsApi;

/// Price of each coin at the previous alert evaluation.
pub type ReferencePrices = HashMap<String, f64>;

/// Ids of fired alerts whose delete on the service has not gone through.
pub type PendingDeletes = BTreeSet<String>;

/// Creates, evaluates and retires price alerts.
///
/// An alert fires when the price crosses its target between two
/// consecutive evaluations (or sits exactly on it). The first time a coin
/// is observed only establishes which side of the target it is on.
pub struct AlertService;

impl AlertService {
    pub fn new() -> Self {
        Self
    }

    /// Parse a user-entered target price. Any finite number is accepted.
    pub fn parse_target(input: &str) -> Result<f64, CoreError> {
        let target: f64 = input.trim().parse().map_err(|_| {
            CoreError::ValidationError(format!("Target price is not a number: {input:?}"))
        })?;
        if !target.is_finite() {
            return Err(CoreError::ValidationError(format!(
                "Target price must be finite, got {target}"
            )));
        }
        Ok(target)
    }

    /// Did the price meet `target` moving from `previous` to `current`?
    pub fn crossing(previous: Option<f64>, current: f64, target: f64) -> Option<AlertCrossing> {
        if current == target {
            return Some(AlertCrossing::Touched);
        }
        match previous {
            Some(prev) if prev < target && current >= target => Some(AlertCrossing::Rose),
            Some(prev) if prev > target && current <= target => Some(AlertCrossing::Fell),
            _ => None,
        }
    }

    /// Find every alert whose condition is met by the snapshot, then move
    /// the reference prices forward to the snapshot.
    ///
    /// Only call this with a freshly loaded alert list: the references move
    /// even for coins without alerts. Alerts for coins missing from the
    /// snapshot (or without a price) are skipped.
    pub fn evaluate(
        &self,
        alerts: &[PriceAlert],
        coins: &[CoinMarket],
        reference: &mut ReferencePrices,
    ) -> Vec<TriggeredAlert> {
        let mut triggered = Vec::new();

        for alert in alerts {
            let Some(coin) = coins.iter().find(|c| c.id == alert.coin_id) else {
                continue;
            };
            let Some(current) = coin.current_price else {
                continue;
            };
            let previous = reference.get(&coin.id).copied();
            if let Some(crossing) = Self::crossing(previous, current, alert.target_price) {
                triggered.push(TriggeredAlert {
                    alert: alert.clone(),
                    coin_name: coin.name.clone(),
                    current_price: current,
                    crossing,
                });
            }
        }

        for coin in coins {
            if let Some(price) = coin.current_price {
                reference.insert(coin.id.clone(), price);
            }
        }

        triggered
    }

    /// Replace `alerts` with the service's list. On failure the list is
    /// emptied and the error returned for logging.
    pub async fn refresh(
        &self,
        api: &dyn AlertsApi,
        alerts: &mut Vec<PriceAlert>,
    ) -> Result<usize, CoreError> {
        match api.list_alerts().await {
            Ok(list) => {
                *alerts = list;
                Ok(alerts.len())
            }
            Err(e) => {
                alerts.clear();
                Err(e)
            }
        }
    }

    /// Retry the deletes in `pending` after a successful `refresh`.
    ///
    /// Ids the service no longer lists are forgotten. Every retried alert is
    /// dropped from `alerts`, deleted or not, so it cannot fire again.
    pub async fn retry_deletes(
        &self,
        api: &dyn AlertsApi,
        alerts: &mut Vec<PriceAlert>,
        pending: &mut PendingDeletes,
    ) {
        pending.retain(|id| alerts.iter().any(|a| &a.id == id));
        let ids: Vec<String> = pending.iter().cloned().collect();
        for id in &ids {
            match api.delete_alert(id).await {
                Ok(()) => {
                    pending.remove(id);
                }
                Err(e) => tracing::warn!("Alert {id} still not deleted: {e}"),
            }
        }
        alerts.retain(|a| !ids.contains(&a.id));
    }

    /// Submit a new alert and append the stored copy to `alerts`.
    pub async fn create(
        &self,
        api: &dyn AlertsApi,
        alerts: &mut Vec<PriceAlert>,
        new_alert: NewAlert,
    ) -> Result<PriceAlert, CoreError> {
        let created = api.create_alert(&new_alert).await?;
        alerts.push(created.clone());
        Ok(created)
    }

    /// Delete on the service, then drop it locally. A failed delete leaves
    /// the local list untouched.
    pub async fn delete(
        &self,
        api: &dyn AlertsApi,
        alerts: &mut Vec<PriceAlert>,
        alert_id: &str,
    ) -> Result<(), CoreError> {
        api.delete_alert(alert_id).await?;
        alerts.retain(|a| a.id != alert_id);
        Ok(())
    }
}

impl Default for AlertService {
    fn default() -> Self {
        Self::new()
    }
}
